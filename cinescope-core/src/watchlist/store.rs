//! Watchlist state and its persisted document.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cinescope_catalog::{MediaIdentity, MediaSummary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::WatchlistError;
use super::persistence::KeyValueStore;

const DOCUMENT_VERSION: u32 = 1;

/// A saved item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub identity: MediaIdentity,
    pub summary: MediaSummary,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WatchlistDocument {
    version: u32,
    entries: Vec<WatchlistEntry>,
}

/// Ordered, deduplicated list of saved items.
///
/// Every mutation is visible immediately and then written through to the
/// backend. Entries are keyed by the full identity, so a movie and a series
/// sharing a numeric id are distinct entries.
#[derive(Debug)]
pub struct WatchlistStore {
    entries: Vec<WatchlistEntry>,
    backend: Arc<dyn KeyValueStore>,
    key: String,
    dirty: bool,
}

impl WatchlistStore {
    /// Loads the watchlist stored under `key`.
    ///
    /// A document that cannot be parsed is logged and replaced by an empty
    /// list; it is only overwritten by the next mutation.
    ///
    /// # Errors
    /// - `WatchlistError::Storage` - If the backend cannot be read
    pub async fn open(
        backend: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
    ) -> Result<Self, WatchlistError> {
        let key = key.into();
        let entries = match backend.load(&key).await? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<WatchlistDocument>(&raw) {
                Ok(document) => dedupe(document.entries),
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding unreadable watchlist");
                    Vec::new()
                }
            },
        };

        info!(key = %key, entries = entries.len(), "Watchlist loaded");
        Ok(Self {
            entries,
            backend,
            key,
            dirty: false,
        })
    }

    /// Adds an item, or refreshes its summary if already present.
    ///
    /// `identity` is authoritative and is written into the stored summary.
    /// A refreshed entry keeps its position and `added_at`.
    ///
    /// # Errors
    /// - `WatchlistError` - If the change could not be persisted
    pub async fn add(
        &mut self,
        mut item: MediaSummary,
        identity: MediaIdentity,
    ) -> Result<(), WatchlistError> {
        item.identity = identity;

        match self.entries.iter_mut().find(|e| e.identity == identity) {
            Some(existing) => {
                debug!(%identity, "Refreshing watchlist entry");
                existing.summary = item;
            }
            None => {
                info!(%identity, title = %item.title, "Added to watchlist");
                self.entries.push(WatchlistEntry {
                    identity,
                    summary: item,
                    added_at: Utc::now(),
                });
            }
        }

        self.persist().await
    }

    /// Removes an item; returns whether it was present.
    ///
    /// Removing an absent item is a no-op and writes nothing.
    ///
    /// # Errors
    /// - `WatchlistError` - If the change could not be persisted
    pub async fn remove(&mut self, identity: MediaIdentity) -> Result<bool, WatchlistError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.identity != identity);
        if self.entries.len() == before {
            return Ok(false);
        }

        info!(%identity, "Removed from watchlist");
        self.persist().await?;
        Ok(true)
    }

    /// Adds the item if absent, removes it otherwise; returns whether it is
    /// now saved.
    ///
    /// # Errors
    /// - `WatchlistError` - If the change could not be persisted
    pub async fn toggle(
        &mut self,
        item: MediaSummary,
        identity: MediaIdentity,
    ) -> Result<bool, WatchlistError> {
        if self.contains_identity(identity) {
            self.remove(identity).await?;
            Ok(false)
        } else {
            self.add(item, identity).await?;
            Ok(true)
        }
    }

    /// Whether any entry has this numeric id, regardless of media type.
    pub fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|e| e.identity.id == id)
    }

    /// Whether this exact identity is saved.
    pub fn contains_identity(&self, identity: MediaIdentity) -> bool {
        self.entries.iter().any(|e| e.identity == identity)
    }

    /// Entries in the order they were first added.
    pub fn list(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether in-memory state has not reached the backend yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Retries a failed write, if any.
    ///
    /// # Errors
    /// - `WatchlistError` - If the write fails again
    pub async fn flush(&mut self) -> Result<(), WatchlistError> {
        if self.dirty {
            self.persist().await?;
        }
        Ok(())
    }

    async fn persist(&mut self) -> Result<(), WatchlistError> {
        let document = WatchlistDocument {
            version: DOCUMENT_VERSION,
            entries: self.entries.clone(),
        };
        let encoded = serde_json::to_string(&document).map_err(|e| WatchlistError::Encode {
            reason: e.to_string(),
        })?;

        match self.backend.store(&self.key, &encoded).await {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Watchlist write failed, keeping changes in memory");
                self.dirty = true;
                Err(e.into())
            }
        }
    }
}

/// Keeps the first entry per identity.
fn dedupe(entries: Vec<WatchlistEntry>) -> Vec<WatchlistEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.identity))
        .collect()
}
