//! Configuration management for euphony-media
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `EUPHONY_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/euphony-media/config.toml` (user config, XDG)
//! 4. `/etc/euphony-media/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! Environment variable format: `EUPHONY_SECTION__FIELD_NAME`, for example
//! `EUPHONY_STORAGE__MAX_FILE_SIZE=20971520`.
//!
//! # Example Configuration
//!
//! ```toml
//! [storage]
//! upload_dir = "/var/lib/euphony/uploads"
//! max_file_size = 10485760
//! public_prefix = "/uploads"
//!
//! [streaming]
//! buffer_size = 8192
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default maximum upload size (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default chunk size for streaming copies (8 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Default public prefix of stored file references
pub const DEFAULT_PUBLIC_PREFIX: &str = "/uploads";

const SERVICE_NAME: &str = "euphony-media";

/// Media storage settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageSettings {
    /// Base directory holding the category subdirectories
    pub upload_dir: PathBuf,

    /// Maximum accepted upload size in bytes
    pub max_file_size: u64,

    /// URL prefix of references handed out to callers
    pub public_prefix: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
        }
    }
}

/// Range streaming settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StreamingSettings {
    /// Size of each chunk copied from disk to the client
    pub buffer_size: usize,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    /// `host:port` string for binding a listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Complete euphony-media configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MediaConfig {
    /// Storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Streaming settings
    #[serde(default)]
    pub streaming: StreamingSettings,

    /// Server settings
    #[serde(default)]
    pub server: ServerSettings,
}

impl MediaConfig {
    /// Load configuration from the standard locations
    ///
    /// Precedence, lowest first: defaults, `/etc/euphony-media/config.toml`,
    /// the user XDG config, `./config.toml`, `EUPHONY_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be parsed or the merged
    /// values fail [`MediaConfig::validate`].
    pub fn load() -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::string(&toml::to_string(&Self::default())?));

        let system_config = PathBuf::from("/etc")
            .join(SERVICE_NAME)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let user_config = Self::recommended_path();
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        figment = figment.merge(Env::prefixed("EUPHONY_").split("__").lowercase(true));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Defaults fill anything the file leaves out; environment variables
    /// override everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the file contains invalid TOML, values have the
    /// wrong type, or the merged values fail [`MediaConfig::validate`].
    pub fn load_from(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let config: Self = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path.into()))
            .merge(Env::prefixed("EUPHONY_").split("__").lowercase(true))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the recommended XDG config path
    #[must_use]
    pub fn recommended_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| config_dir.join(SERVICE_NAME).join("config.toml"),
        )
    }

    /// Reject values the store and streamer cannot work with
    ///
    /// # Errors
    ///
    /// Returns an error for a zero size limit, a zero buffer size, or a
    /// public prefix that is not an absolute URL path.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.max_file_size == 0 {
            anyhow::bail!("storage.max_file_size must be greater than zero");
        }
        if self.streaming.buffer_size == 0 {
            anyhow::bail!("streaming.buffer_size must be greater than zero");
        }
        let prefix = &self.storage.public_prefix;
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            anyhow::bail!(
                "storage.public_prefix must look like '/uploads', got '{prefix}'"
            );
        }
        Ok(())
    }
}
