//! Single-file multipart upload extractor
//!
//! The file part is read chunk by chunk and rejected as soon as it grows past
//! the configured `storage.max_file_size`, so an oversize upload never sits
//! in memory in full.
//!
//! ```rust,no_run
//! use axum::{extract::{Path, State}, Json};
//! use euphony_media::extractors::FileUpload;
//! use euphony_media::state::MediaState;
//!
//! async fn upload(
//!     State(state): State<MediaState>,
//!     Path(category): Path<String>,
//!     upload: FileUpload,
//! ) -> Result<Json<String>, euphony_media::error::MediaError> {
//!     let reference = state.storage().store(upload.into_descriptor(category)).await?;
//!     Ok(Json(reference.into_string()))
//! }
//! ```

use crate::config::MediaConfig;
use crate::error::ErrorKind;
use crate::storage::UploadDescriptor;
use axum::{
    extract::{multipart::Field, FromRef, FromRequest, Multipart, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::{Bytes, BytesMut};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Rejections produced while reading an upload
#[derive(Debug, Error)]
pub enum FileUploadError {
    /// No part carried a file name
    #[error("No file found in upload")]
    MissingFile,

    /// More than one file part was sent
    #[error("Multiple files found, expected a single file")]
    MultipleFiles,

    /// The multipart body could not be parsed
    #[error("Multipart error: {message}")]
    Multipart {
        /// Status suggested by the multipart parser
        status: StatusCode,
        /// Parser message
        message: String,
    },

    /// The file part grew past the configured limit
    #[error("File exceeds the maximum allowed size of {limit} bytes")]
    FileTooLarge {
        /// Configured maximum in bytes
        limit: u64,
    },
}

impl FileUploadError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::FileTooLarge { .. } => ErrorKind::TooLarge,
            Self::Multipart { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                ErrorKind::TooLarge
            }
            _ => ErrorKind::BadInput,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for FileUploadError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        Self::Multipart {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<axum::extract::multipart::MultipartRejection> for FileUploadError {
    fn from(e: axum::extract::multipart::MultipartRejection) -> Self {
        Self::Multipart {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl IntoResponse for FileUploadError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Rejected multipart upload");
        let kind = self.kind();
        let body = json!({
            "error": kind.as_str(),
            "message": self.to_string(),
        });
        (kind.status(), Json(body)).into_response()
    }
}

/// A single uploaded file, not yet validated against a category
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// File name from the part's `Content-Disposition`
    pub file_name: String,
    /// Part `Content-Type`, `application/octet-stream` if absent
    pub content_type: String,
    /// File bytes
    pub data: Bytes,
}

impl FileUpload {
    /// Pairs the upload with the category it is destined for
    #[must_use]
    pub fn into_descriptor(self, category: impl Into<String>) -> UploadDescriptor {
        UploadDescriptor::new(self.file_name, self.content_type, category, self.data)
    }
}

impl<S> FromRequest<S> for FileUpload
where
    S: Send + Sync,
    Arc<MediaConfig>: FromRef<S>,
{
    type Rejection = FileUploadError;

    #[allow(clippy::manual_async_fn)]
    fn from_request(
        req: Request,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let limit = Arc::<MediaConfig>::from_ref(state).storage.max_file_size;
            let mut multipart = Multipart::from_request(req, state).await?;

            let mut upload = None;
            while let Some(field) = multipart.next_field().await? {
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                if upload.is_some() {
                    return Err(FileUploadError::MultipleFiles);
                }

                let content_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string();
                let data = read_field_data(field, limit).await?;

                upload = Some(Self {
                    file_name,
                    content_type,
                    data,
                });
            }

            upload.ok_or(FileUploadError::MissingFile)
        }
    }
}

/// Reads a part while enforcing the size limit chunk by chunk
async fn read_field_data(mut field: Field<'_>, limit: u64) -> Result<Bytes, FileUploadError> {
    let mut data = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        if (data.len() + chunk.len()) as u64 > limit {
            return Err(FileUploadError::FileTooLarge { limit });
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data.freeze())
}
