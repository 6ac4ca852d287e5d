//! Core types for media storage

use super::category::ContentCategory;
use crate::error::{MediaError, MediaResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An upload waiting to be stored
///
/// Exists only for the duration of one store operation. The category is the
/// caller-declared name and is validated by the store.
///
/// # Examples
///
/// ```rust
/// use euphony_media::storage::UploadDescriptor;
///
/// let upload = UploadDescriptor::new("cover.png", "image/png", "image", vec![0x89, 0x50]);
/// assert_eq!(upload.size(), 2);
/// assert_eq!(upload.extension(), Some("png"));
/// ```
#[derive(Debug, Clone)]
pub struct UploadDescriptor {
    /// Original file name as sent by the client
    pub original_name: String,

    /// Declared MIME type
    pub content_type: String,

    /// Declared size in bytes, if the client sent one
    pub declared_size: Option<u64>,

    /// Declared content category name
    pub category: String,

    /// File bytes
    pub data: Bytes,
}

impl UploadDescriptor {
    /// Creates a descriptor whose declared size is the payload length
    #[must_use]
    pub fn new(
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        category: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: content_type.into(),
            declared_size: None,
            category: category.into(),
            data: data.into(),
        }
    }

    /// Records the size the client declared for the upload
    #[must_use]
    pub const fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    /// Number of payload bytes
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Size used for limit checks: the larger of declared and actual
    #[must_use]
    pub const fn effective_size(&self) -> u64 {
        let actual = self.size();
        match self.declared_size {
            Some(declared) if declared > actual => declared,
            _ => actual,
        }
    }

    /// Extension of the original file name, without the dot
    ///
    /// Returns `None` when there is no dot or nothing follows it.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = base_name(&self.original_name);
        match name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => Some(ext),
            _ => None,
        }
    }
}

/// Final path component of a client-supplied name, with either separator
pub(super) fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Opaque handle of a stored file, e.g. `/uploads/audio/song_1700000000000_AbCdEfGh.mp3`
///
/// Only the media store builds or resolves these; callers persist and pass
/// them back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredFileReference(String);

impl StoredFileReference {
    /// Builds the reference of a file stored under `prefix`
    #[must_use]
    pub fn build(prefix: &str, category: ContentCategory, file_name: &str) -> Self {
        Self(format!("{prefix}/{}/{file_name}", category.directory()))
    }

    /// Borrows the reference string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the reference into its string form
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StoredFileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoredFileReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A reference split into its validated parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference<'a> {
    /// Category owning the directory segment
    pub category: ContentCategory,
    /// Generated file name
    pub file_name: &'a str,
}

impl<'a> ParsedReference<'a> {
    /// Parses the canonical `<prefix>/<dir>/<name>` form
    ///
    /// Anything else is rejected rather than guessed: missing prefix,
    /// backslashes, empty or dot segments, unknown directories and nested
    /// paths.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::InvalidReference`].
    pub fn parse(prefix: &str, reference: &'a str) -> MediaResult<Self> {
        let invalid = || MediaError::InvalidReference(reference.to_string());

        if reference.contains('\\') || reference.contains('\0') {
            return Err(invalid());
        }

        let rest = reference
            .strip_prefix(prefix)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(invalid)?;

        let (directory, file_name) = rest.split_once('/').ok_or_else(invalid)?;
        if !is_plain_segment(file_name) {
            return Err(invalid());
        }

        let category = ContentCategory::from_directory(directory).ok_or_else(invalid)?;
        Ok(Self {
            category,
            file_name,
        })
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('/')
}
