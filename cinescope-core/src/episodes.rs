//! Per-season episode cache for the currently open show.
//!
//! Only one show is cached at a time. Opening a different show discards
//! every cached season and in-flight fetch of the previous one. Concurrent
//! requests for the same season share a single catalog call; failures are
//! never cached, so the next request refetches.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cinescope_catalog::{CatalogError, CatalogProvider, Episode, Season};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

type EpisodeFetch = Shared<BoxFuture<'static, Result<Arc<Vec<Episode>>, CatalogError>>>;

/// Episodes of one season as delivered to the view.
///
/// A failed fetch yields an empty list together with the error; the view
/// shows an empty selector and may call again.
#[derive(Debug, Clone)]
pub struct SeasonEpisodes {
    pub show_id: u64,
    pub season_number: u32,
    pub episodes: Arc<Vec<Episode>>,
    pub error: Option<CatalogError>,
}

impl SeasonEpisodes {
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

#[derive(Default)]
struct ShowState {
    show_id: Option<u64>,
    /// Bumped whenever the open show changes; fetches started under an older
    /// view must not write into the cache.
    view: u64,
    selected_season: Option<u32>,
    entries: HashMap<u32, Arc<Vec<Episode>>>,
    in_flight: HashMap<u32, EpisodeFetch>,
}

impl ShowState {
    fn switch_to(&mut self, show_id: u64) {
        if self.show_id == Some(show_id) {
            return;
        }
        if let Some(previous) = self.show_id {
            debug!(previous, show_id, "Invalidating episode cache");
        }
        self.show_id = Some(show_id);
        self.view += 1;
        self.selected_season = None;
        self.entries.clear();
        self.in_flight.clear();
    }
}

/// Episode cache scoped to the open show.
pub struct EpisodeCache {
    catalog: Arc<dyn CatalogProvider>,
    state: Arc<Mutex<ShowState>>,
}

impl fmt::Debug for EpisodeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("EpisodeCache")
            .field("show_id", &state.show_id)
            .field("selected_season", &state.selected_season)
            .field("cached_seasons", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

enum Lookup {
    Hit(Arc<Vec<Episode>>),
    Pending(EpisodeFetch),
}

impl EpisodeCache {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self {
            catalog,
            state: Arc::new(Mutex::new(ShowState::default())),
        }
    }

    /// Makes `show_id` the open show and prefetches the first listed season.
    ///
    /// The prefetch is spawned on the current Tokio runtime when there is one;
    /// otherwise it starts with the first [`EpisodeCache::episodes`] call.
    /// Returns the season being prefetched. Reopening the open show keeps its
    /// cache.
    pub fn open_show(&self, show_id: u64, seasons: &[Season]) -> Option<u32> {
        let mut state = self.state.lock();
        state.switch_to(show_id);

        let first = seasons.first()?.season_number;
        if state.selected_season.is_none() {
            state.selected_season = Some(first);
        }
        if state.entries.contains_key(&first) || state.in_flight.contains_key(&first) {
            return Some(first);
        }

        info!(show_id, season = first, "Prefetching first season");
        let fetch = self.start_fetch(&mut state, show_id, first);
        drop(state);

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Err(error) = fetch.await {
                    warn!(show_id, season = first, %error, "Season prefetch failed");
                }
            });
        }
        Some(first)
    }

    /// Episodes of a season, from cache or from the catalog.
    ///
    /// A request for a show other than the open one switches the cache to
    /// that show first.
    pub async fn episodes(&self, show_id: u64, season_number: u32) -> SeasonEpisodes {
        let lookup = {
            let mut state = self.state.lock();
            state.switch_to(show_id);

            if let Some(episodes) = state.entries.get(&season_number) {
                debug!(show_id, season = season_number, "Episode cache hit");
                Lookup::Hit(Arc::clone(episodes))
            } else if let Some(fetch) = state.in_flight.get(&season_number) {
                debug!(show_id, season = season_number, "Joining in-flight episode fetch");
                Lookup::Pending(fetch.clone())
            } else {
                debug!(show_id, season = season_number, "Episode cache miss");
                Lookup::Pending(self.start_fetch(&mut state, show_id, season_number))
            }
        };

        let result = match lookup {
            Lookup::Hit(episodes) => Ok(episodes),
            Lookup::Pending(fetch) => fetch.await,
        };

        match result {
            Ok(episodes) => SeasonEpisodes {
                show_id,
                season_number,
                episodes,
                error: None,
            },
            Err(error) => {
                warn!(show_id, season = season_number, %error, "Failed to load episodes");
                SeasonEpisodes {
                    show_id,
                    season_number,
                    episodes: Arc::new(Vec::new()),
                    error: Some(error),
                }
            }
        }
    }

    /// Marks a season as selected and returns its episodes.
    pub async fn select_season(&self, show_id: u64, season_number: u32) -> SeasonEpisodes {
        {
            let mut state = self.state.lock();
            state.switch_to(show_id);
            state.selected_season = Some(season_number);
        }
        self.episodes(show_id, season_number).await
    }

    pub fn selected_season(&self) -> Option<u32> {
        self.state.lock().selected_season
    }

    pub fn current_show(&self) -> Option<u64> {
        self.state.lock().show_id
    }

    /// Whether a season of the open show is cached.
    pub fn is_cached(&self, show_id: u64, season_number: u32) -> bool {
        let state = self.state.lock();
        state.show_id == Some(show_id) && state.entries.contains_key(&season_number)
    }

    /// Drops the open show and everything cached for it.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.show_id.take().is_some() {
            debug!("Closing episode cache");
        }
        state.view += 1;
        state.selected_season = None;
        state.entries.clear();
        state.in_flight.clear();
    }

    /// Registers a coalesced fetch for a season of the open view.
    fn start_fetch(&self, state: &mut ShowState, show_id: u64, season_number: u32) -> EpisodeFetch {
        let catalog = Arc::clone(&self.catalog);
        let shared_state = Arc::clone(&self.state);
        let view = state.view;

        let fetch = async move {
            let result = catalog
                .season_episodes(show_id, season_number)
                .await
                .map(Arc::new);

            let mut state = shared_state.lock();
            if state.view == view {
                state.in_flight.remove(&season_number);
                if let Ok(episodes) = &result {
                    state.entries.insert(season_number, Arc::clone(episodes));
                }
            }
            result
        }
        .boxed()
        .shared();

        state.in_flight.insert(season_number, fetch.clone());
        fetch
    }
}

#[cfg(test)]
mod tests {
    use cinescope_catalog::MockCatalog;

    use super::*;

    fn episodes(count: u32) -> Vec<Episode> {
        (1..=count)
            .map(|n| Episode {
                episode_number: n,
                name: format!("Episode {n}"),
                overview: String::new(),
                still_path: None,
                air_date: None,
                runtime_minutes: Some(50),
            })
            .collect()
    }

    fn season(season_number: u32) -> Season {
        Season {
            season_number,
            name: format!("Season {season_number}"),
            episode_count: 3,
            air_date: None,
            poster_path: None,
        }
    }

    fn setup() -> (Arc<MockCatalog>, EpisodeCache) {
        let catalog = Arc::new(MockCatalog::new());
        catalog.add_season(1399, 1, episodes(10));
        catalog.add_season(1399, 2, episodes(10));
        catalog.add_season(90228, 1, episodes(6));
        let cache = EpisodeCache::new(catalog.clone());
        (catalog, cache)
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let (catalog, cache) = setup();

        let first = cache.episodes(1399, 1).await;
        let second = cache.episodes(1399, 1).await;

        assert_eq!(first.episodes.len(), 10);
        assert!(Arc::ptr_eq(&first.episodes, &second.episodes));
        assert_eq!(catalog.season_calls(1399, 1), 1);
        assert!(cache.is_cached(1399, 1));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let (catalog, cache) = setup();
        let gate = catalog.hold_season(1399, 2);

        let (a, b, ()) = tokio::join!(cache.episodes(1399, 2), cache.episodes(1399, 2), async {
            tokio::task::yield_now().await;
            gate.release();
        });

        assert_eq!(catalog.season_calls(1399, 2), 1);
        assert_eq!(a.episodes.len(), 10);
        assert!(Arc::ptr_eq(&a.episodes, &b.episodes));
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let (catalog, cache) = setup();
        catalog.fail_season(1399, 1, 1);

        let failed = cache.episodes(1399, 1).await;
        assert!(failed.is_empty());
        assert!(failed.error.is_some());
        assert!(!cache.is_cached(1399, 1));

        let retried = cache.episodes(1399, 1).await;
        assert!(retried.error.is_none());
        assert_eq!(retried.episodes.len(), 10);
        assert_eq!(catalog.season_calls(1399, 1), 2);
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter() {
        let (catalog, cache) = setup();
        catalog.fail_season(1399, 2, 1);
        let gate = catalog.hold_season(1399, 2);

        let (a, b, ()) = tokio::join!(cache.episodes(1399, 2), cache.episodes(1399, 2), async {
            tokio::task::yield_now().await;
            gate.release();
        });

        assert!(a.error.is_some() && b.error.is_some());
        assert_eq!(catalog.season_calls(1399, 2), 1);
    }

    #[tokio::test]
    async fn test_switching_show_invalidates() {
        let (catalog, cache) = setup();

        cache.episodes(1399, 1).await;
        cache.episodes(90228, 1).await;
        assert!(!cache.is_cached(1399, 1));
        assert_eq!(cache.current_show(), Some(90228));

        cache.episodes(1399, 1).await;
        assert_eq!(catalog.season_calls(1399, 1), 2);
    }

    #[tokio::test]
    async fn test_stale_fetch_does_not_populate_new_show() {
        let (catalog, cache) = setup();
        let gate = catalog.hold_season(1399, 1);

        let (old, ()) = tokio::join!(cache.episodes(1399, 1), async {
            tokio::task::yield_now().await;
            cache.open_show(90228, &[season(1)]);
            gate.release();
        });

        assert_eq!(old.episodes.len(), 10);
        assert_eq!(cache.current_show(), Some(90228));
        assert!(!cache.is_cached(1399, 1));

        let current = cache.episodes(90228, 1).await;
        assert_eq!(current.episodes.len(), 6);
        assert_eq!(catalog.season_calls(90228, 1), 1);
    }

    #[tokio::test]
    async fn test_open_show_prefetches_first_listed_season() {
        let (catalog, cache) = setup();
        catalog.add_season(1399, 0, episodes(2));

        let prefetched = cache.open_show(1399, &[season(0), season(1), season(2)]);
        assert_eq!(prefetched, Some(0));
        assert_eq!(cache.selected_season(), Some(0));

        let specials = cache.episodes(1399, 0).await;
        assert_eq!(specials.episodes.len(), 2);
        assert_eq!(catalog.season_calls(1399, 0), 1);
        assert_eq!(catalog.season_calls(1399, 1), 0);

        assert_eq!(cache.open_show(1399, &[]), None);
        assert!(cache.is_cached(1399, 0));
    }

    #[tokio::test]
    async fn test_failed_prefetch_is_refetched_on_request() {
        let (catalog, cache) = setup();
        catalog.fail_season(1399, 1, 1);

        cache.open_show(1399, &[season(1), season(2)]);
        tokio::task::yield_now().await;
        assert_eq!(catalog.season_calls(1399, 1), 1);
        assert!(!cache.is_cached(1399, 1));

        let requested = cache.episodes(1399, 1).await;
        assert!(requested.error.is_none());
        assert_eq!(requested.episodes.len(), 10);
        assert_eq!(catalog.season_calls(1399, 1), 2);
    }

    #[tokio::test]
    async fn test_select_season_tracks_selection() {
        let (catalog, cache) = setup();
        cache.open_show(1399, &[season(1), season(2)]);

        let second = cache.select_season(1399, 2).await;
        assert_eq!(second.season_number, 2);
        assert_eq!(cache.selected_season(), Some(2));

        cache.select_season(1399, 1).await;
        assert_eq!(catalog.season_calls(1399, 1), 1);
    }

    #[test]
    fn test_open_show_without_runtime_fetches_lazily() {
        let (catalog, cache) = setup();
        cache.open_show(90228, &[season(1)]);
        assert_eq!(catalog.season_calls(90228, 1), 0);

        let result = tokio_test::block_on(cache.episodes(90228, 1));
        assert_eq!(result.episodes.len(), 6);
        assert_eq!(catalog.season_calls(90228, 1), 1);
    }
}
