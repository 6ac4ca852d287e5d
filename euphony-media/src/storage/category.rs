//! Content categories and their validation table

use crate::error::{MediaError, MediaResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed classification governing where and how an upload is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    /// Album covers and artist pictures
    Image,
    /// Song files
    Audio,
    /// User profile pictures
    ProfileImage,
}

/// Validation and layout metadata for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySpec {
    /// Prefix the declared MIME type must start with
    pub mime_prefix: &'static str,
    /// Subdirectory of the upload root
    pub directory: &'static str,
    /// Lowercase extensions accepted for the category
    pub extensions: &'static [&'static str],
}

const IMAGE: CategorySpec = CategorySpec {
    mime_prefix: "image/",
    directory: "images",
    extensions: &["jpg", "jpeg", "png", "gif"],
};

const AUDIO: CategorySpec = CategorySpec {
    mime_prefix: "audio/",
    directory: "audio",
    extensions: &["mp3", "wav", "ogg"],
};

const PROFILE_IMAGE: CategorySpec = CategorySpec {
    mime_prefix: "image/",
    directory: "profiles",
    extensions: &["jpg", "jpeg", "png"],
};

const ACCEPTED_NAMES: &str = "image, audio, profile";

impl ContentCategory {
    /// Every category, in table order
    pub const ALL: [Self; 3] = [Self::Image, Self::Audio, Self::ProfileImage];

    /// Table row for this category
    #[must_use]
    pub const fn spec(self) -> &'static CategorySpec {
        match self {
            Self::Image => &IMAGE,
            Self::Audio => &AUDIO,
            Self::ProfileImage => &PROFILE_IMAGE,
        }
    }

    /// Expected MIME type prefix, e.g. `image/`
    #[must_use]
    pub const fn mime_prefix(self) -> &'static str {
        self.spec().mime_prefix
    }

    /// Storage subdirectory name
    #[must_use]
    pub const fn directory(self) -> &'static str {
        self.spec().directory
    }

    /// Allowed lowercase file extensions
    #[must_use]
    pub const fn allowed_extensions(self) -> &'static [&'static str] {
        self.spec().extensions
    }

    /// Looks up the category owning a storage subdirectory
    #[must_use]
    pub fn from_directory(directory: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.directory() == directory)
    }

    /// Parses a caller-declared category name (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::InvalidCategory`] for unknown names.
    pub fn parse(name: &str) -> MediaResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "profile" | "profile_image" | "profile-image" => Ok(Self::ProfileImage),
            _ => Err(MediaError::InvalidCategory {
                given: name.to_string(),
                allowed: ACCEPTED_NAMES.to_string(),
            }),
        }
    }

    /// Checks the declared MIME type against the category prefix
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::UnsupportedMediaType`] on mismatch.
    pub fn check_mime(self, content_type: &str) -> MediaResult<()> {
        let normalized = content_type.trim().to_ascii_lowercase();
        if normalized.starts_with(self.mime_prefix()) {
            Ok(())
        } else {
            Err(MediaError::UnsupportedMediaType(format!(
                "'{content_type}' is not allowed for {self} uploads, expected {}*",
                self.mime_prefix()
            )))
        }
    }

    /// Checks an extension (any case) against the allowed set
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::UnsupportedMediaType`] listing the allowed set.
    pub fn check_extension(self, extension: &str) -> MediaResult<()> {
        let lower = extension.to_ascii_lowercase();
        if self.allowed_extensions().contains(&lower.as_str()) {
            Ok(())
        } else {
            Err(MediaError::UnsupportedMediaType(format!(
                "extension '{extension}' is not allowed for {self} uploads. Allowed extensions: {}",
                self.allowed_extensions().join(", ")
            )))
        }
    }
}

impl FromStr for ContentCategory {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::ProfileImage => "profile",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ContentCategory::parse("AUDIO").unwrap(), ContentCategory::Audio);
        assert_eq!(ContentCategory::parse("Image").unwrap(), ContentCategory::Image);
        assert_eq!(
            ContentCategory::parse("profile").unwrap(),
            ContentCategory::ProfileImage
        );
        assert_eq!(
            "profile_image".parse::<ContentCategory>().unwrap(),
            ContentCategory::ProfileImage
        );
    }

    #[test]
    fn test_parse_unknown_lists_allowed() {
        let err = ContentCategory::parse("video").unwrap_err();
        assert!(matches!(err, MediaError::InvalidCategory { .. }));
        assert!(err.to_string().contains("audio"));
    }

    #[test]
    fn test_table_layout() {
        assert_eq!(ContentCategory::Image.directory(), "images");
        assert_eq!(ContentCategory::Audio.directory(), "audio");
        assert_eq!(ContentCategory::ProfileImage.directory(), "profiles");
        assert_eq!(ContentCategory::ProfileImage.mime_prefix(), "image/");
        assert!(!ContentCategory::ProfileImage
            .allowed_extensions()
            .contains(&"gif"));
    }

    #[test]
    fn test_from_directory() {
        for category in ContentCategory::ALL {
            assert_eq!(
                ContentCategory::from_directory(category.directory()),
                Some(category)
            );
        }
        assert_eq!(ContentCategory::from_directory("etc"), None);
    }

    #[test]
    fn test_check_mime() {
        assert!(ContentCategory::Audio.check_mime("audio/mpeg").is_ok());
        assert!(ContentCategory::Audio.check_mime("Audio/Ogg").is_ok());
        assert!(matches!(
            ContentCategory::Audio.check_mime("image/png"),
            Err(MediaError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_check_extension_any_case() {
        assert!(ContentCategory::Image.check_extension("JPG").is_ok());
        let err = ContentCategory::Audio.check_extension("flac").unwrap_err();
        assert!(err.to_string().contains("mp3, wav, ogg"));
    }
}
