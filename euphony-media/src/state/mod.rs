//! Application state management

use crate::{
    config::MediaConfig,
    error::MediaResult,
    storage::{LocalMediaStore, MediaStorage},
};
use axum::extract::FromRef;
use std::sync::Arc;

/// Shared state handed to every media handler
///
/// Cheap to clone: both fields are reference counted.
///
/// # Example
///
/// ```rust,no_run
/// use euphony_media::{config::MediaConfig, state::MediaState};
///
/// # async fn example() -> anyhow::Result<()> {
/// let state = MediaState::local(MediaConfig::default()).await?;
///
/// let app: axum::Router = axum::Router::new()
///     .route("/", axum::routing::get(|| async { "ok" }))
///     .with_state(state);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MediaState {
    storage: Arc<dyn MediaStorage>,
    config: Arc<MediaConfig>,
}

impl MediaState {
    /// Wraps an existing store
    #[must_use]
    pub fn new(storage: Arc<dyn MediaStorage>, config: MediaConfig) -> Self {
        Self {
            storage,
            config: Arc::new(config),
        }
    }

    /// Creates a [`LocalMediaStore`] from the storage settings
    ///
    /// # Errors
    ///
    /// Returns an error if the upload directories cannot be prepared.
    pub async fn local(config: MediaConfig) -> MediaResult<Self> {
        let storage = LocalMediaStore::new(&config.storage).await?;
        Ok(Self::new(Arc::new(storage), config))
    }

    /// Media store
    #[must_use]
    pub fn storage(&self) -> &dyn MediaStorage {
        self.storage.as_ref()
    }

    /// Loaded configuration
    #[must_use]
    pub fn config(&self) -> &MediaConfig {
        &self.config
    }
}

impl FromRef<MediaState> for Arc<MediaConfig> {
    fn from_ref(state: &MediaState) -> Self {
        state.config.clone()
    }
}
