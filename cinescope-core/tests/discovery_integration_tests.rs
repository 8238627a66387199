//! Integration tests for a discovery session.
//!
//! These tests drive the public `Discovery` API end to end: searching,
//! opening details, browsing seasons, saving titles across restarts and
//! resolving playback URLs.

use std::sync::Arc;

use cinescope_catalog::{
    DemoCatalog, Episode, MediaDetail, MediaIdentity, MediaSummary, MockCatalog, Season,
};
use cinescope_core::discovery::storage_from_config;
use cinescope_core::{
    CinescopeConfig, DetailState, Discovery, MemoryKeyValueStore, Resolution, TypeFilter,
};

/// Test fixture sharing one catalog and one storage backend across sessions.
struct DiscoveryTestFixture {
    catalog: Arc<MockCatalog>,
    storage: MemoryKeyValueStore,
}

impl DiscoveryTestFixture {
    /// Creates a fixture with one scripted series and one movie.
    fn new() -> Self {
        let catalog = Arc::new(MockCatalog::new());

        let show = MediaIdentity::series(7);
        catalog.add_detail(detail(show, "Seven Seasons", &[1, 2]));
        catalog.add_recommendations(show, Vec::new());
        catalog.add_season(7, 1, episodes(8));
        catalog.add_season(7, 2, episodes(10));

        let movie = MediaIdentity::movie(42);
        catalog.add_detail(detail(movie, "The Answer", &[]));
        catalog.add_recommendations(movie, vec![summary(MediaIdentity::movie(43), "Question")]);

        Self {
            catalog,
            storage: MemoryKeyValueStore::new(),
        }
    }

    /// Starts a session, as a fresh process would.
    async fn session(&self) -> Discovery {
        Discovery::init(
            CinescopeConfig::default(),
            self.catalog.clone(),
            Arc::new(self.storage.clone()),
        )
        .await
        .unwrap()
    }
}

fn summary(identity: MediaIdentity, title: &str) -> MediaSummary {
    MediaSummary {
        identity,
        title: title.to_string(),
        release_year: Some(2019),
        poster_path: Some("/poster.jpg".to_string()),
        backdrop_path: Some("/backdrop.jpg".to_string()),
        rating: Some(8.1),
        overview: Some("Overview".to_string()),
    }
}

fn detail(identity: MediaIdentity, title: &str, seasons: &[u32]) -> MediaDetail {
    MediaDetail {
        summary: summary(identity, title),
        release_date: None,
        runtime_minutes: (!identity.is_series()).then_some(95),
        episode_runtimes: Vec::new(),
        genres: Vec::new(),
        cast: Vec::new(),
        trailers: Vec::new(),
        seasons: seasons
            .iter()
            .map(|&season_number| Season {
                season_number,
                name: format!("Season {season_number}"),
                episode_count: 8,
                air_date: None,
                poster_path: None,
            })
            .collect(),
        tagline: None,
    }
}

fn episodes(count: u32) -> Vec<Episode> {
    (1..=count)
        .map(|episode_number| Episode {
            episode_number,
            name: format!("Chapter {episode_number}"),
            overview: String::new(),
            still_path: None,
            air_date: None,
            runtime_minutes: Some(45),
        })
        .collect()
}

#[tokio::test]
async fn test_demo_search_filters_people_and_imageless_titles() {
    let session = Discovery::init(
        CinescopeConfig::default(),
        Arc::new(DemoCatalog::new()),
        Arc::new(MemoryKeyValueStore::new()),
    )
    .await
    .unwrap();

    let outcome = session
        .search()
        .query("dune", 1, TypeFilter::All)
        .await
        .into_current()
        .unwrap();

    let ids: Vec<_> = outcome.results.items.iter().map(|s| s.identity).collect();
    assert_eq!(
        ids,
        [
            MediaIdentity::movie(438631),
            MediaIdentity::movie(693134),
            MediaIdentity::movie(841),
            MediaIdentity::series(90228),
        ]
    );
    assert_eq!(outcome.results.total_results, 6);

    let series_only = session
        .search()
        .set_type_filter(TypeFilter::Series)
        .await
        .into_current()
        .unwrap();
    assert_eq!(series_only.results.items.len(), 1);
    assert_eq!(session.search().state().page, 1);
}

#[tokio::test]
async fn test_series_season_is_fetched_once() {
    let fixture = DiscoveryTestFixture::new();
    let session = fixture.session().await;
    let show = MediaIdentity::series(7);

    let resolution = session.open_details(show).await;
    assert!(matches!(
        resolution,
        Resolution::Current(DetailState::Ready { .. })
    ));
    assert_eq!(session.episodes().selected_season(), Some(1));

    let first = session.episodes().select_season(7, 1).await;
    let again = session.episodes().select_season(7, 1).await;

    assert_eq!(first.episodes.len(), 8);
    assert!(Arc::ptr_eq(&first.episodes, &again.episodes));
    assert_eq!(fixture.catalog.season_calls(7, 1), 1);
    assert_eq!(fixture.catalog.season_calls(7, 2), 0);
}

#[tokio::test]
async fn test_failed_season_recovers_on_next_request() {
    let fixture = DiscoveryTestFixture::new();
    fixture.catalog.fail_season(7, 2, 1);
    let session = fixture.session().await;

    let failed = session.episodes().select_season(7, 2).await;
    assert!(failed.is_empty());
    assert!(failed.error.is_some());

    let recovered = session.episodes().select_season(7, 2).await;
    assert_eq!(recovered.episodes.len(), 10);
    assert_eq!(fixture.catalog.season_calls(7, 2), 2);
}

#[tokio::test]
async fn test_last_opened_title_owns_the_view() {
    let fixture = DiscoveryTestFixture::new();
    let session = fixture.session().await;
    let show = MediaIdentity::series(7);
    let movie = MediaIdentity::movie(42);
    let gate = fixture.catalog.hold_details(show);

    let (show_result, movie_result) = tokio::join!(session.open_details(show), async {
        tokio::task::yield_now().await;
        let result = session.open_details(movie).await;
        gate.release();
        result
    });

    assert!(show_result.is_stale());
    assert!(matches!(
        movie_result,
        Resolution::Current(DetailState::Ready { .. })
    ));
    assert_eq!(session.details().state().identity(), Some(movie));
    assert_eq!(session.episodes().current_show(), None);
}

#[tokio::test]
async fn test_watchlist_survives_restart() {
    let fixture = DiscoveryTestFixture::new();
    let show = MediaIdentity::series(7);
    let movie = MediaIdentity::movie(42);

    {
        let mut session = fixture.session().await;
        session
            .watchlist_mut()
            .add(summary(show, "Seven Seasons"), show)
            .await
            .unwrap();
        session
            .watchlist_mut()
            .add(summary(movie, "The Answer"), movie)
            .await
            .unwrap();
        session.shutdown().await.unwrap();
    }

    let session = fixture.session().await;
    let restored: Vec<_> = session.watchlist().list().iter().map(|e| e.identity).collect();
    assert_eq!(restored, [show, movie]);
    assert!(session.watchlist().contains(42));
    assert!(!session.watchlist().contains(43));
}

#[tokio::test]
async fn test_file_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = CinescopeConfig::for_testing(dir.path());
    let movie = MediaIdentity::movie(438631);

    {
        let mut session = Discovery::init(
            config.clone(),
            Arc::new(DemoCatalog::new()),
            storage_from_config(&config.storage),
        )
        .await
        .unwrap();
        let Some(DetailState::Ready { detail, .. }) =
            session.open_details(movie).await.into_current()
        else {
            panic!("expected ready state");
        };
        assert!(session.toggle_watchlist(&detail.summary).await.unwrap());
        session.shutdown().await.unwrap();
    }

    let session = Discovery::init(
        config.clone(),
        Arc::new(DemoCatalog::new()),
        storage_from_config(&config.storage),
    )
    .await
    .unwrap();
    assert!(session.watchlist().contains_identity(movie));
    assert!(dir.path().join("watchlist.json").exists());
}

#[tokio::test]
async fn test_playback_urls_for_movie_and_episode() {
    let fixture = DiscoveryTestFixture::new();
    let session = fixture.session().await;

    let movie = session.play(MediaIdentity::movie(42), None, None);
    assert_eq!(movie.len(), 4);
    assert_eq!(movie[0].url, "https://vidora.su/movie/42");

    let episode = session.play(MediaIdentity::series(7), Some(2), Some(5));
    assert_eq!(episode[0].url, "https://vidora.su/tv/7/2/5");
    assert_eq!(episode[3].url, "https://vidlink.pro/tv/7/2/5");
}
