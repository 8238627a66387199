//! Cinescope Core - Client-side orchestration for media discovery
//!
//! Reconciles catalog metadata with locally persisted user state: the
//! watchlist, per-season episode caching, playback provider resolution and
//! the request coordination behind the details and search views.

pub mod config;
pub mod details;
pub mod discovery;
pub mod episodes;
pub mod generation;
pub mod playback;
pub mod search;
pub mod tracing_setup;
pub mod watchlist;

pub use cinescope_catalog::{CatalogError, CatalogProvider, MediaIdentity, MediaType};
pub use config::{CinescopeConfig, ConfigError};
pub use details::{DetailAggregator, DetailError, DetailState};
pub use discovery::Discovery;
pub use episodes::{EpisodeCache, SeasonEpisodes};
pub use generation::{RequestGeneration, Resolution, Ticket};
pub use playback::{PlaybackCandidate, PlaybackResolver, ProviderTable, ProviderTemplate};
pub use search::{SearchOutcome, SearchQueryState, SearchResults, SearchSession, TypeFilter};
pub use watchlist::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError, WatchlistEntry,
    WatchlistError, WatchlistStore,
};

/// Errors that can bubble up from any Cinescope subsystem.
///
/// Every variant is scoped to the view that triggered it; none is fatal to
/// the process.
#[derive(Debug, thiserror::Error)]
pub enum CinescopeError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Watchlist error: {0}")]
    Watchlist(#[from] WatchlistError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl CinescopeError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            CinescopeError::Catalog(e) => match e {
                CatalogError::MissingCredentials => {
                    "No catalog API key configured (set CINESCOPE_TMDB_API_KEY)".to_string()
                }
                CatalogError::NotFound { what } => format!("Nothing found for {what}"),
                _ => "Failed to reach the catalog, try again".to_string(),
            },
            CinescopeError::Watchlist(_) | CinescopeError::Storage(_) => {
                "Could not save your watchlist".to_string()
            }
            CinescopeError::Configuration(e) => format!("Configuration error: {e}"),
        }
    }

    /// Checks if re-invoking the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CinescopeError::Catalog(e) => e.is_retryable(),
            CinescopeError::Watchlist(_) | CinescopeError::Storage(_) => true,
            CinescopeError::Configuration(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CinescopeError>;
