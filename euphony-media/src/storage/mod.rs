//! Media file storage
//!
//! Validates uploads against their [`ContentCategory`], assigns
//! collision-resistant names, and keeps every file access inside the
//! configured upload root.
//!
//! # Examples
//!
//! ```rust,no_run
//! use euphony_media::config::StorageSettings;
//! use euphony_media::storage::{LocalMediaStore, MediaStorage, UploadDescriptor};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = LocalMediaStore::new(&StorageSettings::default()).await?;
//!
//! let cover = UploadDescriptor::new("cover.png", "image/png", "image", vec![0x89, 0x50]);
//! let reference = store.store(cover).await?;
//! assert!(reference.as_str().starts_with("/uploads/images/cover_"));
//! # Ok(())
//! # }
//! ```

mod category;
mod local;
pub mod naming;
mod traits;
mod types;

pub use category::{CategorySpec, ContentCategory};
pub use local::LocalMediaStore;
pub use traits::{ContentStream, MediaStorage};
pub use types::{ParsedReference, StoredFileReference, UploadDescriptor};

#[cfg(test)]
pub use traits::MockMediaStorage;
