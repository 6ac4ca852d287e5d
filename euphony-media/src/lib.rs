//! euphony-media: media storage and byte-range streaming for the Euphony
//! music service
//!
//! Two cooperating pieces sit behind a small axum surface:
//!
//! - **Media store** ([`storage`]): validates uploads against a fixed
//!   category table, gives them collision-resistant names, and confines every
//!   file access to the configured upload root.
//! - **Range streamer** ([`streaming`]): resolves a `Range` header against
//!   the file on disk and streams exactly that window in bounded chunks.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use euphony_media::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MediaConfig::load()?;
//!     euphony_media::observability::init()?;
//!
//!     let addr = config.server.bind_address();
//!     let state = MediaState::local(config).await?;
//!
//!     let listener = tokio::net::TcpListener::bind(&addr).await?;
//!     axum::serve(listener, router(state)).await?;
//!     Ok(())
//! }
//! ```

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod observability;
pub mod state;
pub mod storage;
pub mod streaming;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! ```rust
    //! use euphony_media::prelude::*;
    //! ```

    pub use crate::config::MediaConfig;
    pub use crate::error::{MediaError, MediaResult};
    pub use crate::handlers::router;
    pub use crate::state::MediaState;
    pub use crate::storage::{
        ContentCategory, LocalMediaStore, MediaStorage, StoredFileReference, UploadDescriptor,
    };
    pub use crate::streaming::{resolve_request, StreamingPlan};
}
