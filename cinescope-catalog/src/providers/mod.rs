//! Catalog provider implementations.

use async_trait::async_trait;

use crate::errors::CatalogError;
use crate::types::{Episode, MediaDetail, MediaIdentity, MediaSummary, SearchPage};

pub mod demo;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod tmdb;

pub use demo::DemoCatalog;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{CatalogGate, MockCatalog};
pub use tmdb::TmdbCatalog;

/// Read-only access to the remote media catalog.
///
/// Implementations own transport concerns, including request timeouts.
/// Nothing in Cinescope writes back through this trait.
#[async_trait]
pub trait CatalogProvider: Send + Sync + std::fmt::Debug {
    /// Fetches one unfiltered page of multi-type search results.
    ///
    /// # Errors
    /// - `CatalogError::Network` - Provider unreachable
    /// - `CatalogError::Status` - Provider answered with a non-2xx status
    /// - `CatalogError::Parse` - Response body could not be decoded
    async fn search_media(&self, term: &str, page: u32) -> Result<SearchPage, CatalogError>;

    /// Fetches the full detail record of a movie or series.
    ///
    /// # Errors
    /// - `CatalogError::Network` - Provider unreachable
    /// - `CatalogError::Status` - Provider answered with a non-2xx status
    /// - `CatalogError::NotFound` - No item with this identity
    async fn media_details(&self, identity: MediaIdentity) -> Result<MediaDetail, CatalogError>;

    /// Fetches recommendations for an item; each shares the item's media type.
    ///
    /// # Errors
    /// - `CatalogError::Network` - Provider unreachable
    /// - `CatalogError::Status` - Provider answered with a non-2xx status
    async fn recommendations(
        &self,
        identity: MediaIdentity,
    ) -> Result<Vec<MediaSummary>, CatalogError>;

    /// Fetches the ordered episode list of one season.
    ///
    /// # Errors
    /// - `CatalogError::Network` - Provider unreachable
    /// - `CatalogError::Status` - Provider answered with a non-2xx status
    /// - `CatalogError::NotFound` - Show or season does not exist
    async fn season_episodes(
        &self,
        show_id: u64,
        season_number: u32,
    ) -> Result<Vec<Episode>, CatalogError>;
}
