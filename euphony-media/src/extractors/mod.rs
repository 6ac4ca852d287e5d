//! Axum extractors for media requests

mod category;
mod file_upload;

pub use category::CategoryPath;
pub use file_upload::{FileUpload, FileUploadError};
