//! Persisted user watchlist.

pub mod persistence;
pub mod store;

pub use persistence::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError};
pub use store::{WatchlistEntry, WatchlistStore};

/// Errors raised by watchlist operations.
///
/// A failed write never rolls back the in-memory change; the store stays
/// dirty and the next mutation or [`WatchlistStore::flush`] retries.
#[derive(Debug, thiserror::Error)]
pub enum WatchlistError {
    #[error("Failed to persist watchlist: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode watchlist: {reason}")]
    Encode { reason: String },
}
