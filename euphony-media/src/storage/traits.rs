//! Media storage trait definitions

use super::types::{StoredFileReference, UploadDescriptor};
use crate::error::MediaResult;
use async_trait::async_trait;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Owned byte stream used to replace the content of a stored file
pub type ContentStream = Pin<Box<dyn AsyncRead + Send>>;

/// Abstraction over the media store used by the HTTP handlers
///
/// The store is the only authority that builds or resolves
/// [`StoredFileReference`]s.
///
/// # Examples
///
/// ```rust,no_run
/// use euphony_media::config::MediaConfig;
/// use euphony_media::storage::{LocalMediaStore, MediaStorage, UploadDescriptor};
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = LocalMediaStore::new(&MediaConfig::default().storage).await?;
///
/// let upload = UploadDescriptor::new("intro.mp3", "audio/mpeg", "audio", vec![/* ... */]);
/// let reference = store.store(upload).await?;
///
/// let path = store.resolve(reference.as_str()).await?;
/// println!("stored at {}", path.display());
///
/// store.delete(reference.as_str()).await?;
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Validates and writes an upload, returning its reference
    ///
    /// # Errors
    ///
    /// Fails with a validation, capacity, unsupported-type or security
    /// error before anything is written, or with an I/O error if the write
    /// itself fails.
    async fn store(&self, descriptor: UploadDescriptor) -> MediaResult<StoredFileReference>;

    /// Deletes the file behind a reference
    ///
    /// Not idempotent: deleting an absent file fails with `NotFound`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidReference`, `PathEscape`, `NotFound` or `Io`.
    async fn delete(&self, reference: &str) -> MediaResult<()>;

    /// Replaces the bytes of an existing file, keeping its name and reference
    ///
    /// # Errors
    ///
    /// Fails with `InvalidCategory`, `InvalidReference`, `PathEscape`,
    /// `NotFound` or `Io`.
    async fn update_existing(
        &self,
        reference: &str,
        content: ContentStream,
        category: &str,
    ) -> MediaResult<StoredFileReference>;

    /// Resolves a reference to the absolute path of an existing file
    ///
    /// # Errors
    ///
    /// Fails with `InvalidReference`, `PathEscape` or `NotFound`.
    async fn resolve(&self, reference: &str) -> MediaResult<PathBuf>;

    /// Checks whether a reference points at an existing file
    ///
    /// # Errors
    ///
    /// Fails with `InvalidReference` or `PathEscape` for malformed references.
    async fn exists(&self, reference: &str) -> MediaResult<bool>;
}
