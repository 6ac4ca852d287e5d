//! Media upload, replacement, streaming and deletion handlers
//!
//! | Method   | Path                                   | Result                 |
//! |----------|----------------------------------------|------------------------|
//! | `POST`   | `/api/v1/media/{category}`             | 201 `{"reference"}`    |
//! | `PUT`    | `/api/v1/media/{category}/{file_name}` | 200 `{"reference"}`    |
//! | `GET`    | `<prefix>/{dir}/{file_name}`           | 200 / 206 file stream  |
//! | `DELETE` | `<prefix>/{dir}/{file_name}`           | 204                    |

use crate::error::{MediaError, MediaResult};
use crate::extractors::{CategoryPath, FileUpload};
use crate::state::MediaState;
use crate::storage::StoredFileReference;
use crate::streaming;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header::RANGE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the file limit
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Body returned by upload and replace
#[derive(Debug, Serialize, Deserialize)]
pub struct ReferenceResponse {
    /// Reference of the stored file
    pub reference: StoredFileReference,
}

/// Builds the media router
///
/// File routes are mounted under the configured public prefix so stored
/// references double as download URLs.
pub fn router(state: MediaState) -> Router {
    let prefix = state.config().storage.public_prefix.trim_end_matches('/');
    let file_route = format!("{prefix}/{{dir}}/{{file_name}}");
    let body_limit = state
        .config()
        .storage
        .max_file_size
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .route("/api/v1/media/{category}", post(upload))
        .route("/api/v1/media/{category}/{file_name}", put(replace))
        .route(&file_route, get(download).delete(remove))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Stores a multipart upload in the given category
///
/// The category is checked before the body is read.
pub async fn upload(
    State(state): State<MediaState>,
    CategoryPath(category): CategoryPath,
    upload: FileUpload,
) -> MediaResult<impl IntoResponse> {
    let reference = state
        .storage()
        .store(upload.into_descriptor(category.to_string()))
        .await?;
    Ok((StatusCode::CREATED, Json(ReferenceResponse { reference })))
}

/// Replaces the bytes of an existing file with the raw request body
pub async fn replace(
    State(state): State<MediaState>,
    CategoryPath(category): CategoryPath,
    Path((_, file_name)): Path<(String, String)>,
    body: Bytes,
) -> MediaResult<Json<ReferenceResponse>> {
    let reference = file_reference(&state, category.directory(), &file_name);

    let reference = state
        .storage()
        .update_existing(
            &reference,
            Box::pin(Cursor::new(body)),
            &category.to_string(),
        )
        .await?;
    Ok(Json(ReferenceResponse { reference }))
}

/// Streams a stored file, honoring a single `Range`
pub async fn download(
    State(state): State<MediaState>,
    Path((dir, file_name)): Path<(String, String)>,
    headers: HeaderMap,
) -> MediaResult<Response> {
    let reference = file_reference(&state, &dir, &file_name);
    let path = state.storage().resolve(&reference).await?;

    let range = headers
        .get(RANGE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| MediaError::InvalidRange("non-ASCII Range header".to_string()))
        })
        .transpose()?;

    streaming::serve_file(&path, range, state.config().streaming.buffer_size).await
}

/// Deletes a stored file
pub async fn remove(
    State(state): State<MediaState>,
    Path((dir, file_name)): Path<(String, String)>,
) -> MediaResult<StatusCode> {
    let reference = file_reference(&state, &dir, &file_name);
    state.storage().delete(&reference).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn file_reference(state: &MediaState, dir: &str, file_name: &str) -> String {
    let prefix = state.config().storage.public_prefix.trim_end_matches('/');
    format!("{prefix}/{dir}/{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;
    use crate::storage::MockMediaStorage;
    use axum_test::TestServer;
    use serde_json::Value;
    use std::sync::Arc;

    fn same(actual: &str, expected: &str) -> bool {
        actual == expected
    }

    fn server_with(mock: MockMediaStorage) -> TestServer {
        let state = MediaState::new(Arc::new(mock), MediaConfig::default());
        TestServer::new(router(state)).unwrap()
    }

    #[tokio::test]
    async fn test_path_escape_renders_generic_message() {
        let mut mock = MockMediaStorage::new();
        mock.expect_resolve().returning(|_| {
            Err(MediaError::PathEscape {
                path: "/srv/etc/passwd".to_string(),
            })
        });

        let response = server_with(mock).get("/uploads/audio/x.mp3").await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["error"], "forbidden_path");
        assert!(!body["message"].as_str().unwrap().contains("passwd"));
    }

    #[tokio::test]
    async fn test_io_error_renders_internal() {
        let mut mock = MockMediaStorage::new();
        mock.expect_delete().returning(|_| {
            Err(MediaError::io(
                "Failed to delete the file",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "EACCES"),
            ))
        });

        let response = server_with(mock).delete("/uploads/audio/x.mp3").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = response.json();
        assert_eq!(body["error"], "internal");
        assert!(!body["message"].as_str().unwrap().contains("EACCES"));
    }

    #[tokio::test]
    async fn test_delete_passes_reference_through() {
        let mut mock = MockMediaStorage::new();
        mock.expect_delete()
            .withf(|reference| same(reference, "/uploads/images/cover_1_abcdefgh.png"))
            .times(1)
            .returning(|_| Ok(()));

        let response = server_with(mock)
            .delete("/uploads/images/cover_1_abcdefgh.png")
            .await;
        response.assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_replace_maps_category_to_directory() {
        let mut mock = MockMediaStorage::new();
        mock.expect_update_existing()
            .withf(|reference, _, category| {
                same(reference, "/uploads/audio/song_1_abcdefgh.mp3") && same(category, "audio")
            })
            .times(1)
            .returning(|reference, _, _| {
                crate::storage::ParsedReference::parse("/uploads", reference).map(|parsed| {
                    StoredFileReference::build("/uploads", parsed.category, parsed.file_name)
                })
            });

        let response = server_with(mock)
            .put("/api/v1/media/audio/song_1_abcdefgh.mp3")
            .bytes(Bytes::from_static(b"retagged"))
            .await;
        response.assert_status_ok();

        let body: ReferenceResponse = response.json();
        assert_eq!(body.reference.as_str(), "/uploads/audio/song_1_abcdefgh.mp3");
    }

    #[tokio::test]
    async fn test_replace_rejects_unknown_category_before_storage() {
        let mock = MockMediaStorage::new();

        let response = server_with(mock)
            .put("/api/v1/media/video/clip.mp4")
            .bytes(Bytes::from_static(b"x"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
