//! Error types and error handling
//!
//! Every media operation fails with a [`MediaError`]. Each variant carries a
//! human-readable reason and maps to an [`ErrorKind`], which in turn decides
//! the HTTP status the error renders with.
//!
//! Validation and capacity errors explain how to fix the request (accepted
//! categories, allowed extensions, size limit). Security and internal errors
//! render a generic message; the detail stays in the server log.

use axum::{
    body::Body,
    http::{
        header::{CONTENT_RANGE, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Severity class of a [`MediaError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-correctable input problem (400)
    BadInput,
    /// Payload exceeds the configured maximum (413)
    TooLarge,
    /// MIME type or extension not accepted for the category (415)
    UnsupportedType,
    /// Referenced file does not exist (404)
    NotFound,
    /// Resolved path escapes the storage root (400, generic message)
    Security,
    /// Requested byte range cannot be served (416)
    RangeNotSatisfiable,
    /// Unexpected I/O failure (500, generic message)
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable name used in error bodies
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadInput => "bad_input",
            Self::TooLarge => "payload_too_large",
            Self::UnsupportedType => "unsupported_media_type",
            Self::NotFound => "not_found",
            Self::Security => "forbidden_path",
            Self::RangeNotSatisfiable => "range_not_satisfiable",
            Self::Internal => "internal",
        }
    }

    /// HTTP status for this severity
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::BadInput | Self::Security => StatusCode::BAD_REQUEST,
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RangeNotSatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Media storage and streaming error
#[derive(Debug, Error)]
pub enum MediaError {
    /// Declared content category is not one of the known variants
    #[error("Invalid content category '{given}'. Allowed values: {allowed}")]
    InvalidCategory {
        /// Category name supplied by the caller
        given: String,
        /// Accepted category names
        allowed: String,
    },

    /// Upload carried no bytes
    #[error("The uploaded file is empty")]
    EmptyPayload,

    /// Upload exceeds the configured size limit
    #[error("File size {actual} bytes exceeds the maximum allowed size of {limit} bytes")]
    PayloadTooLarge {
        /// Size of the upload in bytes
        actual: u64,
        /// Configured maximum in bytes
        limit: u64,
    },

    /// Declared MIME type or extension does not fit the category
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Original file name contains a `..` traversal sequence
    ///
    /// Other unsafe characters are replaced when the stored name is built.
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    /// Original file name has no extension
    #[error("The file name '{0}' has no extension")]
    MissingExtension(String),

    /// Reference is not in the canonical `/uploads/<dir>/<name>` form
    #[error("Invalid file reference: {0}")]
    InvalidReference(String),

    /// Referenced file does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// Resolved path escapes the storage root
    ///
    /// The path is kept for logging only and never rendered to clients.
    #[error("The file path is not allowed")]
    PathEscape {
        /// Offending resolved path
        path: String,
    },

    /// Malformed `Range` header
    #[error("Invalid range request: {0}")]
    InvalidRange(String),

    /// Range lies outside the file
    #[error("Range not satisfiable (file size: {size})")]
    RangeNotSatisfiable {
        /// Total size of the file in bytes
        size: u64,
    },

    /// Client went away while the body was being written
    #[error("Client aborted the transfer")]
    ClientAborted(#[source] std::io::Error),

    /// Unexpected filesystem failure
    #[error("{context}")]
    Io {
        /// Stable description of the failed operation
        context: &'static str,
        /// Underlying OS error, logged but not rendered
        #[source]
        source: std::io::Error,
    },
}

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Wraps an I/O error with a stable context message
    #[must_use]
    pub const fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    /// Severity class of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCategory { .. }
            | Self::EmptyPayload
            | Self::InvalidFileName(_)
            | Self::MissingExtension(_)
            | Self::InvalidReference(_)
            | Self::InvalidRange(_) => ErrorKind::BadInput,
            Self::PayloadTooLarge { .. } => ErrorKind::TooLarge,
            Self::UnsupportedMediaType(_) => ErrorKind::UnsupportedType,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PathEscape { .. } => ErrorKind::Security,
            Self::RangeNotSatisfiable { .. } => ErrorKind::RangeNotSatisfiable,
            Self::ClientAborted(_) | Self::Io { .. } => ErrorKind::Internal,
        }
    }

    /// HTTP status this error renders with
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.kind().status()
    }

    /// Message safe to show to clients
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "An internal storage error occurred".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        match &self {
            Self::PathEscape { path } => {
                tracing::error!(path = %path, "Rejected path outside the storage root");
            }
            Self::Io { context, source } => {
                tracing::error!(error = %source, "{context}");
            }
            Self::ClientAborted(source) => {
                tracing::debug!(error = %source, "Client aborted the transfer");
            }
            _ => {}
        }

        let kind = self.kind();
        let body = json!({
            "error": kind.as_str(),
            "message": self.public_message(),
        });

        if let Self::RangeNotSatisfiable { size } = self {
            return Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(CONTENT_RANGE, format!("bytes */{size}"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap_or_else(|_| Response::new(Body::empty()));
        }

        (kind.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_mapping() {
        assert_eq!(MediaError::EmptyPayload.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            MediaError::PayloadTooLarge { actual: 11, limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            MediaError::UnsupportedMediaType("text/plain".into()).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            MediaError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MediaError::PathEscape { path: "/etc".into() }.kind(),
            ErrorKind::Security
        );
        assert_eq!(
            MediaError::RangeNotSatisfiable { size: 10 }.status(),
            StatusCode::RANGE_NOT_SATISFIABLE
        );
    }

    #[test]
    fn test_security_message_is_generic() {
        let err = MediaError::PathEscape {
            path: "/var/uploads/../../etc/passwd".into(),
        };
        assert!(!err.public_message().contains("passwd"));
    }

    #[test]
    fn test_io_message_hides_os_detail() {
        let err = MediaError::io(
            "Failed to delete file",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "EACCES /secret/path"),
        );
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.public_message().contains("/secret/path"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_range_not_satisfiable_response_has_content_range() {
        let response = MediaError::RangeNotSatisfiable { size: 100 }.into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers().get(CONTENT_RANGE).unwrap(), "bytes */100");
    }

    #[test]
    fn test_too_large_message_reports_limit() {
        let err = MediaError::PayloadTooLarge {
            actual: 20,
            limit: 10,
        };
        let message = err.public_message();
        assert!(message.contains("20"));
        assert!(message.contains("10"));
    }
}
