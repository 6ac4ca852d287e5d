//! HTTP responses for streamed media

use super::range::{resolve_request, StreamingPlan};
use super::reader::RangeReader;
use crate::error::{MediaError, MediaResult};
use axum::{
    body::Body,
    http::{
        header::{
            ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
            LAST_MODIFIED,
        },
        StatusCode,
    },
    response::Response,
};
use std::path::Path;
use std::time::SystemTime;

/// Builds a streamed 200/206 response for a resolved file
///
/// The file size is read from disk at request time; the body is produced
/// lazily by a [`RangeReader`], one buffer at a time.
///
/// # Errors
///
/// - [`MediaError::NotFound`] if the file is gone before streaming begins
/// - [`MediaError::InvalidRange`] or [`MediaError::RangeNotSatisfiable`] for
///   bad `Range` headers
/// - [`MediaError::Io`] if the file cannot be inspected or opened
pub async fn serve_file(
    path: &Path,
    range: Option<&str>,
    buffer_size: usize,
) -> MediaResult<Response> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MediaError::NotFound(path.display().to_string())
        } else {
            MediaError::io("Failed to inspect the file", e)
        }
    })?;

    let plan = resolve_request(metadata.len(), range)?;
    let reader = RangeReader::open(path, &plan, buffer_size).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::debug!(
        file = %file_name,
        start = plan.start,
        end = plan.end,
        length = plan.content_length,
        partial = plan.partial,
        "Streaming media file"
    );

    Ok(build_stream_response(
        reader,
        &plan,
        &file_name,
        metadata.modified().ok(),
    ))
}

fn build_stream_response(
    reader: RangeReader,
    plan: &StreamingPlan,
    file_name: &str,
    modified: Option<SystemTime>,
) -> Response {
    let content_type = mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .to_string();

    let status = if plan.partial {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut response = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, plan.content_length)
        .header(ACCEPT_RANGES, "bytes")
        .header(
            CONTENT_DISPOSITION,
            format!("inline; filename=\"{file_name}\""),
        );

    if plan.partial {
        response = response.header(CONTENT_RANGE, plan.content_range());
    }
    if let Some(modified) = modified {
        response = response.header(LAST_MODIFIED, httpdate::fmt_http_date(modified));
    }

    let chunks = futures_util::stream::try_unfold(reader, |mut reader| async move {
        let chunk = reader.next_chunk().await?;
        Ok::<_, MediaError>(chunk.map(|bytes| (bytes, reader)))
    });

    response
        .body(Body::from_stream(chunks))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use tempfile::TempDir;

    async fn sample_file(len: usize) -> (TempDir, std::path::PathBuf, Vec<u8>) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("song_1700000000000_AbCdEfGh.mp3");
        let data: Vec<u8> = (0..=u8::MAX).cycle().take(len).collect();
        tokio::fs::write(&path, &data).await.unwrap();
        (dir, path, data)
    }

    #[tokio::test]
    async fn test_full_response_headers() {
        let (_dir, path, data) = sample_file(1000).await;

        let response = serve_file(&path, None, 8192).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[ACCEPT_RANGES], "bytes");
        assert_eq!(headers[CONTENT_LENGTH], "1000");
        assert_eq!(headers[CONTENT_TYPE], "audio/mpeg");
        assert_eq!(
            headers[CONTENT_DISPOSITION],
            "inline; filename=\"song_1700000000000_AbCdEfGh.mp3\""
        );
        assert!(headers.get(CONTENT_RANGE).is_none());
        assert!(headers.get(LAST_MODIFIED).is_some());

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], &data[..]);
    }

    #[tokio::test]
    async fn test_partial_response() {
        let (_dir, path, data) = sample_file(1000).await;

        let response = serve_file(&path, Some("bytes=200-499"), 64).await.unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes 200-499/1000");
        assert_eq!(response.headers()[CONTENT_LENGTH], "300");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], &data[200..500]);
    }

    #[tokio::test]
    async fn test_unsatisfiable_range() {
        let (_dir, path, _) = sample_file(100).await;

        let result = serve_file(&path, Some("bytes=100-"), 8192).await;
        assert!(matches!(
            result,
            Err(MediaError::RangeNotSatisfiable { size: 100 })
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = serve_file(&dir.path().join("missing.mp3"), None, 8192).await;
        assert!(matches!(result, Err(MediaError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_file() {
        let (_dir, path, _) = sample_file(0).await;

        let response = serve_file(&path, None, 8192).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "0");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }
}
