//! Detail view state: an item's full record plus its recommendations.
//!
//! Both are fetched concurrently and the view only becomes ready when both
//! succeed. Opening another item while a fetch is in flight supersedes it;
//! the older response is discarded when it arrives.

use std::future::Future;
use std::sync::Arc;

use cinescope_catalog::{
    CatalogError, CatalogProvider, MediaDetail, MediaIdentity, MediaSummary,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::generation::{RequestGeneration, Resolution, Ticket};

/// Failure shown on the detail view.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Failed to load content details")]
pub struct DetailError {
    pub identity: MediaIdentity,
    #[source]
    pub source: CatalogError,
}

/// What the detail view currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DetailState {
    #[default]
    Idle,
    Loading {
        identity: MediaIdentity,
    },
    Ready {
        detail: Arc<MediaDetail>,
        recommendations: Arc<Vec<MediaSummary>>,
    },
    Failed {
        error: DetailError,
    },
}

impl DetailState {
    /// Item this state is about, if any.
    pub fn identity(&self) -> Option<MediaIdentity> {
        match self {
            DetailState::Idle => None,
            DetailState::Loading { identity } => Some(*identity),
            DetailState::Ready { detail, .. } => Some(detail.identity()),
            DetailState::Failed { error } => Some(error.identity),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, DetailState::Loading { .. })
    }
}

/// Coordinates the detail view's fetches.
#[derive(Debug)]
pub struct DetailAggregator {
    catalog: Arc<dyn CatalogProvider>,
    generation: RequestGeneration,
    state: watch::Sender<DetailState>,
}

impl DetailAggregator {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        let (state, _) = watch::channel(DetailState::Idle);
        Self {
            catalog,
            generation: RequestGeneration::new(),
            state,
        }
    }

    /// Opens an item, superseding any open in flight.
    ///
    /// The request is registered when this is called, not when the returned
    /// future is first polled, so call order decides which open wins.
    /// Recommendations inherit the opened item's media type.
    pub fn open(
        &self,
        identity: MediaIdentity,
    ) -> impl Future<Output = Resolution<DetailState>> + Send + '_ {
        let ticket = self.generation.begin();
        self.apply(ticket, DetailState::Loading { identity });
        info!(%identity, "Opening details");

        let catalog = Arc::clone(&self.catalog);
        async move {
            let fetched = futures::try_join!(
                catalog.media_details(identity),
                catalog.recommendations(identity)
            );

            let next = match fetched {
                Ok((detail, recommendations)) => {
                    debug!(%identity, recommendations = recommendations.len(), "Details loaded");
                    DetailState::Ready {
                        detail: Arc::new(detail),
                        recommendations: Arc::new(recommendations),
                    }
                }
                Err(source) => {
                    warn!(%identity, error = %source, "Failed to load content details");
                    DetailState::Failed {
                        error: DetailError { identity, source },
                    }
                }
            };

            self.apply(ticket, next)
        }
    }

    /// Returns the view to idle and discards every in-flight open.
    pub fn close(&self) {
        self.generation.invalidate();
        self.state.send_replace(DetailState::Idle);
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every applied state change.
    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    fn apply(&self, ticket: Ticket, next: DetailState) -> Resolution<DetailState> {
        let mut applied = None;
        self.state.send_if_modified(|state| {
            if !self.generation.is_current(ticket) {
                return false;
            }
            *state = next.clone();
            applied = Some(next.clone());
            true
        });

        match applied {
            Some(state) => Resolution::Current(state),
            None => {
                debug!(identity = ?next.identity(), "Discarding stale detail response");
                Resolution::Stale
            }
        }
    }
}
