//! Local filesystem storage implementation

use super::category::ContentCategory;
use super::naming;
use super::traits::{ContentStream, MediaStorage};
use super::types::{ParsedReference, StoredFileReference, UploadDescriptor};
use crate::config::StorageSettings;
use crate::error::{MediaError, MediaResult};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const INVALID_PATH_SEQUENCE: &str = "..";

/// Local filesystem media store
///
/// Files live in one subdirectory per [`ContentCategory`] under an absolute
/// base directory:
///
/// ```text
/// /var/lib/euphony/uploads/
/// ├── images/
/// │   └── cover_1700000000000_Q2xhc3Mx.png
/// ├── audio/
/// │   └── intro_1700000000456_a9Bc-_x2.mp3
/// └── profiles/
///     └── me_1700000000789_ZGVmYXVs.jpg
/// ```
///
/// The subdirectories are created once by [`LocalMediaStore::new`] and not
/// re-checked per request. Every resolved path is normalized and
/// prefix-checked against the base directory before it is touched.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    /// Absolute, normalized base directory
    base_dir: PathBuf,

    /// Maximum accepted upload size in bytes
    max_file_size: u64,

    /// Prefix of the references handed out
    public_prefix: String,
}

impl LocalMediaStore {
    /// Creates the store and its category directories
    ///
    /// # Errors
    ///
    /// Returns an error if the base path exists but is not a directory, or
    /// if a category directory cannot be created.
    pub async fn new(settings: &StorageSettings) -> MediaResult<Self> {
        let absolute = std::path::absolute(&settings.upload_dir)
            .map_err(|e| MediaError::io("Failed to resolve the upload directory", e))?;
        let base_dir = normalize(&absolute);

        if base_dir.exists() && !base_dir.is_dir() {
            return Err(MediaError::io(
                "The upload directory is not a directory",
                std::io::Error::other(format!("{} is not a directory", base_dir.display())),
            ));
        }

        let store = Self {
            base_dir,
            max_file_size: settings.max_file_size,
            public_prefix: settings.public_prefix.clone(),
        };

        for category in ContentCategory::ALL {
            let dir = store.category_dir(category);
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| MediaError::io("Failed to create a storage directory", e))?;
            tracing::debug!(%category, dir = %dir.display(), "Storage directory ready");
        }

        tracing::info!(base_dir = %store.base_dir.display(), "Media storage initialized");
        Ok(store)
    }

    /// Absolute base directory
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Configured upload size limit in bytes
    #[must_use]
    pub const fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Prefix of the references this store hands out
    #[must_use]
    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// Directory holding files of one category
    #[must_use]
    pub fn category_dir(&self, category: ContentCategory) -> PathBuf {
        self.base_dir.join(category.directory())
    }

    /// Normalizes `path` and fails closed if it leaves the base directory
    fn contain(&self, path: &Path) -> MediaResult<PathBuf> {
        let normalized = normalize(path);
        if normalized.starts_with(&self.base_dir) && normalized != self.base_dir {
            Ok(normalized)
        } else {
            tracing::error!(
                path = %normalized.display(),
                base_dir = %self.base_dir.display(),
                "Resolved path escapes the storage root"
            );
            Err(MediaError::PathEscape {
                path: normalized.display().to_string(),
            })
        }
    }

    /// Parses a reference and resolves it to a contained path
    fn locate<'a>(&self, reference: &'a str) -> MediaResult<(ParsedReference<'a>, PathBuf)> {
        let parsed = ParsedReference::parse(&self.public_prefix, reference)?;
        let path = self.contain(&self.category_dir(parsed.category).join(parsed.file_name))?;
        Ok((parsed, path))
    }

    /// Runs the upload checks in order and returns the category and extension
    fn validate<'a>(
        &self,
        descriptor: &'a UploadDescriptor,
    ) -> MediaResult<(ContentCategory, &'a str)> {
        let category = ContentCategory::parse(&descriptor.category)?;

        if descriptor.data.is_empty() {
            return Err(MediaError::EmptyPayload);
        }

        let size = descriptor.effective_size();
        if size > self.max_file_size {
            return Err(MediaError::PayloadTooLarge {
                actual: size,
                limit: self.max_file_size,
            });
        }

        category.check_mime(&descriptor.content_type)?;

        if descriptor.original_name.contains(INVALID_PATH_SEQUENCE) {
            return Err(MediaError::InvalidFileName(descriptor.original_name.clone()));
        }

        let extension = descriptor
            .extension()
            .ok_or_else(|| MediaError::MissingExtension(descriptor.original_name.clone()))?;
        category.check_extension(extension)?;

        Ok((category, extension))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStore {
    async fn store(&self, descriptor: UploadDescriptor) -> MediaResult<StoredFileReference> {
        let (category, extension) = self.validate(&descriptor).inspect_err(|e| {
            tracing::warn!(
                original_name = %descriptor.original_name,
                content_type = %descriptor.content_type,
                category = %descriptor.category,
                error = %e,
                "Rejected upload"
            );
        })?;

        let file_name = naming::unique_file_name(
            &descriptor.original_name,
            extension,
            Utc::now().timestamp_millis(),
            &descriptor.data,
        );
        let target = self.contain(&self.category_dir(category).join(&file_name))?;
        tracing::debug!(target = %target.display(), "Writing upload");

        if let Err(e) = write_file(&target, &descriptor.data).await {
            let _ = fs::remove_file(&target).await;
            return Err(MediaError::io("Failed to store the file", e));
        }

        let reference = StoredFileReference::build(&self.public_prefix, category, &file_name);
        tracing::info!(%reference, size = descriptor.size(), "Stored media file");
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> MediaResult<()> {
        let (_, path) = self.locate(reference)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(reference, "Deleted media file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(reference, "Delete requested for a missing file");
                Err(MediaError::NotFound(reference.to_string()))
            }
            Err(e) => {
                tracing::error!(reference, path = %path.display(), error = %e, "Failed to delete file");
                Err(MediaError::io("Failed to delete the file", e))
            }
        }
    }

    async fn update_existing(
        &self,
        reference: &str,
        mut content: ContentStream,
        category: &str,
    ) -> MediaResult<StoredFileReference> {
        let category = ContentCategory::parse(category)?;
        let (parsed, target) = self.locate(reference)?;
        if parsed.category != category {
            return Err(MediaError::InvalidReference(format!(
                "{reference} does not belong to the {category} category"
            )));
        }

        let exists = fs::try_exists(&target)
            .await
            .map_err(|e| MediaError::io("Failed to inspect the file", e))?;
        if !exists {
            tracing::warn!(reference, "Update requested for a missing file");
            return Err(MediaError::NotFound(reference.to_string()));
        }

        // Readers streaming the old bytes keep their handle; the rename swaps
        // the directory entry atomically.
        let temp = target.with_file_name(format!(
            ".{}.{}.tmp",
            parsed.file_name,
            Uuid::new_v4().simple()
        ));
        let replaced = async {
            let mut file = fs::File::create(&temp).await?;
            let written = tokio::io::copy(&mut content, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            fs::rename(&temp, &target).await?;
            Ok::<u64, std::io::Error>(written)
        }
        .await;

        match replaced {
            Ok(written) => {
                tracing::info!(reference, size = written, "Replaced media file content");
                Ok(StoredFileReference::build(
                    &self.public_prefix,
                    category,
                    parsed.file_name,
                ))
            }
            Err(e) => {
                let _ = fs::remove_file(&temp).await;
                Err(MediaError::io("Failed to update the file", e))
            }
        }
    }

    async fn resolve(&self, reference: &str) -> MediaResult<PathBuf> {
        let (_, path) = self.locate(reference)?;
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(path),
            Ok(_) => Err(MediaError::NotFound(reference.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MediaError::NotFound(reference.to_string()))
            }
            Err(e) => Err(MediaError::io("Failed to inspect the file", e)),
        }
    }

    async fn exists(&self, reference: &str) -> MediaResult<bool> {
        let (_, path) = self.locate(reference)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| MediaError::io("Failed to inspect the file", e))
    }
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Lexically normalizes a path, resolving `.` and `..` without touching disk
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
