//! Mock provider implementation for testing.
//!
//! Responses are scripted per call, every call is counted, failures can be
//! injected a fixed number of times and any call can be held behind a gate
//! until the test releases it.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use super::CatalogProvider;
use crate::errors::CatalogError;
use crate::types::{Episode, MediaDetail, MediaIdentity, MediaSummary, SearchPage};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CallKey {
    Search(String, u32),
    Details(MediaIdentity),
    Recommendations(MediaIdentity),
    Season(u64, u32),
}

#[derive(Debug, Default)]
struct MockState {
    pages: HashMap<(String, u32), SearchPage>,
    details: HashMap<MediaIdentity, MediaDetail>,
    recommendations: HashMap<MediaIdentity, Vec<MediaSummary>>,
    seasons: HashMap<(u64, u32), Vec<Episode>>,
    calls: HashMap<CallKey, usize>,
    failures: HashMap<CallKey, usize>,
    gates: HashMap<CallKey, watch::Receiver<bool>>,
}

/// Holds matching catalog calls until released.
#[derive(Debug)]
pub struct CatalogGate {
    sender: watch::Sender<bool>,
}

impl CatalogGate {
    /// Lets every held and future matching call proceed.
    pub fn release(&self) {
        self.sender.send_replace(true);
    }
}

/// Scriptable catalog for tests.
#[derive(Debug, Default)]
pub struct MockCatalog {
    state: Mutex<MockState>,
}

impl MockCatalog {
    /// Creates an empty mock catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response for a search term and page.
    pub fn add_search_page(&self, term: &str, page: SearchPage) {
        self.state
            .lock()
            .pages
            .insert((term.to_string(), page.page), page);
    }

    /// Scripts the detail record for its identity.
    pub fn add_detail(&self, detail: MediaDetail) {
        self.state.lock().details.insert(detail.identity(), detail);
    }

    /// Scripts the recommendation list for an identity.
    pub fn add_recommendations(&self, identity: MediaIdentity, items: Vec<MediaSummary>) {
        self.state.lock().recommendations.insert(identity, items);
    }

    /// Scripts the episode list of a season.
    pub fn add_season(&self, show_id: u64, season_number: u32, episodes: Vec<Episode>) {
        self.state
            .lock()
            .seasons
            .insert((show_id, season_number), episodes);
    }

    /// Makes the next `times` searches for this term and page fail.
    pub fn fail_search(&self, term: &str, page: u32, times: usize) {
        self.fail(CallKey::Search(term.to_string(), page), times);
    }

    /// Makes the next `times` detail fetches for this identity fail.
    pub fn fail_details(&self, identity: MediaIdentity, times: usize) {
        self.fail(CallKey::Details(identity), times);
    }

    /// Makes the next `times` recommendation fetches for this identity fail.
    pub fn fail_recommendations(&self, identity: MediaIdentity, times: usize) {
        self.fail(CallKey::Recommendations(identity), times);
    }

    /// Makes the next `times` episode fetches for this season fail.
    pub fn fail_season(&self, show_id: u64, season_number: u32, times: usize) {
        self.fail(CallKey::Season(show_id, season_number), times);
    }

    /// Holds searches for this term and page until the gate is released.
    pub fn hold_search(&self, term: &str, page: u32) -> CatalogGate {
        self.hold(CallKey::Search(term.to_string(), page))
    }

    /// Holds detail fetches for this identity until the gate is released.
    pub fn hold_details(&self, identity: MediaIdentity) -> CatalogGate {
        self.hold(CallKey::Details(identity))
    }

    /// Holds episode fetches for this season until the gate is released.
    pub fn hold_season(&self, show_id: u64, season_number: u32) -> CatalogGate {
        self.hold(CallKey::Season(show_id, season_number))
    }

    /// Total number of search calls across all terms and pages.
    pub fn search_calls(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(key, _)| matches!(key, CallKey::Search(..)))
            .map(|(_, count)| count)
            .sum()
    }

    /// Number of detail calls for an identity.
    pub fn detail_calls(&self, identity: MediaIdentity) -> usize {
        self.count(&CallKey::Details(identity))
    }

    /// Number of recommendation calls for an identity.
    pub fn recommendation_calls(&self, identity: MediaIdentity) -> usize {
        self.count(&CallKey::Recommendations(identity))
    }

    /// Number of episode calls for a season.
    pub fn season_calls(&self, show_id: u64, season_number: u32) -> usize {
        self.count(&CallKey::Season(show_id, season_number))
    }

    fn fail(&self, key: CallKey, times: usize) {
        self.state.lock().failures.insert(key, times);
    }

    fn hold(&self, key: CallKey) -> CatalogGate {
        let (sender, receiver) = watch::channel(false);
        self.state.lock().gates.insert(key, receiver);
        CatalogGate { sender }
    }

    fn count(&self, key: &CallKey) -> usize {
        self.state.lock().calls.get(key).copied().unwrap_or(0)
    }

    /// Records the call, waits on its gate and applies injected failures.
    async fn enter(&self, key: CallKey) -> Result<(), CatalogError> {
        let gate = {
            let mut state = self.state.lock();
            *state.calls.entry(key.clone()).or_default() += 1;
            state.gates.get(&key).cloned()
        };

        if let Some(mut gate) = gate {
            loop {
                let open = *gate.borrow();
                if open {
                    break;
                }
                if gate.changed().await.is_err() {
                    break;
                }
            }
        }

        let mut state = self.state.lock();
        if let Some(remaining) = state.failures.get_mut(&key)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(CatalogError::Network {
                reason: format!("injected failure for {key:?}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for MockCatalog {
    async fn search_media(&self, term: &str, page: u32) -> Result<SearchPage, CatalogError> {
        self.enter(CallKey::Search(term.to_string(), page)).await?;
        Ok(self
            .state
            .lock()
            .pages
            .get(&(term.to_string(), page))
            .cloned()
            .unwrap_or_else(|| SearchPage::empty(page)))
    }

    async fn media_details(&self, identity: MediaIdentity) -> Result<MediaDetail, CatalogError> {
        self.enter(CallKey::Details(identity)).await?;
        self.state
            .lock()
            .details
            .get(&identity)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                what: identity.to_string(),
            })
    }

    async fn recommendations(
        &self,
        identity: MediaIdentity,
    ) -> Result<Vec<MediaSummary>, CatalogError> {
        self.enter(CallKey::Recommendations(identity)).await?;
        Ok(self
            .state
            .lock()
            .recommendations
            .get(&identity)
            .cloned()
            .unwrap_or_default())
    }

    async fn season_episodes(
        &self,
        show_id: u64,
        season_number: u32,
    ) -> Result<Vec<Episode>, CatalogError> {
        self.enter(CallKey::Season(show_id, season_number)).await?;
        self.state
            .lock()
            .seasons
            .get(&(show_id, season_number))
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                what: format!("series:{show_id} season {season_number}"),
            })
    }
}
