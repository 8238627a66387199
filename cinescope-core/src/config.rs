//! Centralized configuration for Cinescope.
//!
//! Defaults live here; every section can be overridden from the environment.
//! The catalog API key has no default and is only ever read from
//! `CINESCOPE_TMDB_API_KEY`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cinescope_catalog::providers::tmdb::DEFAULT_BASE_URL;

use crate::playback::ProviderTable;

/// Errors raised while building or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Playback provider table has no providers")]
    EmptyProviderTable,

    #[error("Playback provider '{name}' is defined more than once")]
    DuplicateProvider { name: String },

    #[error("Provider '{provider}' uses unknown placeholder '{{{placeholder}}}'")]
    UnknownPlaceholder {
        provider: String,
        placeholder: String,
    },

    #[error("Provider '{provider}' template does not render a valid URL: {reason}")]
    InvalidTemplate { provider: String, reason: String },

    #[error("Cannot read provider table {path}: {reason}")]
    ProviderFile { path: PathBuf, reason: String },
}

/// Central configuration for all Cinescope components.
#[derive(Debug, Clone, Default)]
pub struct CinescopeConfig {
    pub catalog: CatalogConfig,
    pub playback: PlaybackConfig,
    pub storage: StorageConfig,
}

/// Catalog provider connection settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// API root of the catalog provider
    pub base_url: String,
    /// Root of the image host, size token and path are appended
    pub image_base_url: String,
    /// Provider credential, never defaulted
    pub api_key: Option<String>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Optional response language such as `en-US`
    pub language: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(15),
            language: None,
        }
    }
}

/// Playback provider table and where it came from.
#[derive(Debug, Clone, Default)]
pub struct PlaybackConfig {
    /// Ordered provider templates
    pub providers: ProviderTable,
    /// JSON file the table was loaded from, if not built in
    pub providers_file: Option<PathBuf>,
}

/// Local persistence settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the key-value files
    pub data_dir: PathBuf,
    /// Storage key of the watchlist document
    pub watchlist_key: String,
    /// Suffix for files written before the atomic rename
    pub temp_file_suffix: &'static str,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            watchlist_key: "watchlist".to_string(),
            temp_file_suffix: ".tmp",
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cinescope")
}

impl CinescopeConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Values that fail to parse are ignored and the default is kept. The
    /// provider table file named by `CINESCOPE_PLAYBACK_PROVIDERS` is only
    /// recorded here; [`CinescopeConfig::load`] reads it.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("CINESCOPE_TMDB_API_KEY")
            && !key.trim().is_empty()
        {
            config.catalog.api_key = Some(key);
        }

        if let Ok(base_url) = std::env::var("CINESCOPE_TMDB_BASE_URL")
            && !base_url.is_empty()
        {
            config.catalog.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("CINESCOPE_REQUEST_TIMEOUT")
            && let Ok(seconds) = timeout.parse::<u64>()
        {
            config.catalog.request_timeout = Duration::from_secs(seconds);
        }

        if let Ok(language) = std::env::var("CINESCOPE_LANGUAGE")
            && !language.is_empty()
        {
            config.catalog.language = Some(language);
        }

        if let Ok(dir) = std::env::var("CINESCOPE_DATA_DIR")
            && !dir.is_empty()
        {
            config.storage.data_dir = PathBuf::from(dir);
        }

        if let Ok(path) = std::env::var("CINESCOPE_PLAYBACK_PROVIDERS")
            && !path.is_empty()
        {
            config.playback.providers_file = Some(PathBuf::from(path));
        }

        config
    }

    /// Environment configuration with the provider table file applied.
    ///
    /// # Errors
    /// - `ConfigError::ProviderFile` - If the named file cannot be read or parsed
    /// - Any validation error of [`ProviderTable::validate`]
    pub async fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_env();
        if let Some(path) = config.playback.providers_file.clone() {
            config.playback.providers = ProviderTable::load(&path).await?;
            tracing::info!(
                path = %path.display(),
                providers = config.playback.providers.providers.len(),
                "Loaded playback provider table"
            );
        }
        Ok(config)
    }

    /// Configuration rooted in a scratch data directory.
    pub fn for_testing(data_dir: &Path) -> Self {
        Self {
            storage: StorageConfig {
                data_dir: data_dir.to_path_buf(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
