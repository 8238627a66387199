//! Cinescope Catalog - Media metadata from the catalog provider
//!
//! Defines the media data model shared by every Cinescope component, the
//! `CatalogProvider` seam the core fetches through, and the provider
//! implementations behind it: the TMDB HTTP client, an offline demo dataset
//! and (with `test-utils`) a scriptable mock.

#![warn(missing_docs)]
#![deny(clippy::missing_errors_doc)]

pub mod errors;
pub mod images;
pub mod providers;
pub mod types;

pub use errors::CatalogError;
pub use images::{ImageSize, image_url};
pub use providers::{CatalogProvider, DemoCatalog, TmdbCatalog};
#[cfg(any(test, feature = "test-utils"))]
pub use providers::{CatalogGate, MockCatalog};
pub use types::{
    CastMember, Episode, Genre, HitKind, MediaDetail, MediaIdentity, MediaSummary, MediaType,
    SearchHit, SearchPage, Season, Trailer, format_runtime,
};

/// Convenience type alias for Results with CatalogError.
pub type Result<T> = std::result::Result<T, CatalogError>;
