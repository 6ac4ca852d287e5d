//! Collision-resistant file naming
//!
//! Generated names look like `<stem>_<millis>_<hash>.<ext>`:
//!
//! - `stem`: the sanitized original stem, at most 15 characters
//! - `millis`: Unix time in milliseconds at store time
//! - `hash`: first 8 characters of the URL-safe base64 SHA-256 of the bytes
//!
//! Names stay traceable to the upload while repeated uploads of the same
//! file name still land on distinct paths.

use super::types::base_name;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

/// Maximum number of stem characters kept in a generated name
pub const MAX_STEM_CHARS: usize = 15;

/// Number of hash characters kept in a generated name
pub const HASH_FRAGMENT_LEN: usize = 8;

const SEPARATOR: char = '_';

/// URL-safe fragment of the SHA-256 digest of `data`
#[must_use]
pub fn content_hash_fragment(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(HASH_FRAGMENT_LEN);
    encoded
}

/// Reduces a client file name to a safe, bounded stem
///
/// Directory components and the extension are dropped; characters outside
/// `[A-Za-z0-9_-]` become `_`. An empty result becomes `file`.
#[must_use]
pub fn sanitize_stem(original_name: &str) -> String {
    let name = base_name(original_name);
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);

    let sanitized: String = stem
        .chars()
        .take(MAX_STEM_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                SEPARATOR
            }
        })
        .collect();

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

/// Builds the stored name for an upload
#[must_use]
pub fn unique_file_name(original_name: &str, extension: &str, timestamp_millis: i64, data: &[u8]) -> String {
    format!(
        "{stem}{SEPARATOR}{timestamp_millis}{SEPARATOR}{hash}.{ext}",
        stem = sanitize_stem(original_name),
        hash = content_hash_fragment(data),
        ext = extension.to_ascii_lowercase(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_fragment_is_url_safe_and_stable() {
        let a = content_hash_fragment(b"hello");
        assert_eq!(a.len(), HASH_FRAGMENT_LEN);
        assert_eq!(a, content_hash_fragment(b"hello"));
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(a, content_hash_fragment(b"hello!"));
    }

    #[test]
    fn test_hash_fragment_known_value() {
        // sha256("") = e3b0c442..., base64url "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
        assert_eq!(content_hash_fragment(b""), "47DEQpj8");
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("My Song.mp3"), "My_Song");
        assert_eq!(sanitize_stem("a very long track title.mp3"), "a_very_long_tra");
        assert_eq!(sanitize_stem("C:\\music\\track.wav"), "track");
        assert_eq!(sanitize_stem("dir/sub/cover.png"), "cover");
        assert_eq!(sanitize_stem(".png"), "file");
        assert_eq!(sanitize_stem("canción.mp3"), "canci_n");
    }

    #[test]
    fn test_unique_file_name_layout() {
        let name = unique_file_name("Track One.MP3", "MP3", 1_700_000_000_123, b"abc");
        let hash = content_hash_fragment(b"abc");
        assert_eq!(name, format!("Track_One_1700000000123_{hash}.mp3"));
    }

    #[test]
    fn test_same_name_different_content_differs() {
        let a = unique_file_name("song.mp3", "mp3", 1, b"one");
        let b = unique_file_name("song.mp3", "mp3", 1, b"two");
        assert_ne!(a, b);
    }
}
