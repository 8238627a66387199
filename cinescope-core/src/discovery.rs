//! Top-level handle tying the discovery components together.

use std::sync::Arc;

use cinescope_catalog::{
    CatalogProvider, DemoCatalog, ImageSize, MediaIdentity, MediaSummary, TmdbCatalog, image_url,
};
use tracing::info;

use crate::config::{CatalogConfig, CinescopeConfig, StorageConfig};
use crate::details::{DetailAggregator, DetailState};
use crate::episodes::EpisodeCache;
use crate::generation::Resolution;
use crate::playback::{PlaybackCandidate, PlaybackResolver};
use crate::search::SearchSession;
use crate::Result;
use crate::watchlist::{FileKeyValueStore, KeyValueStore, WatchlistStore};

/// Owns every per-view coordinator for one user session.
#[derive(Debug)]
pub struct Discovery {
    config: CinescopeConfig,
    watchlist: WatchlistStore,
    details: DetailAggregator,
    episodes: EpisodeCache,
    search: SearchSession,
    playback: PlaybackResolver,
}

impl Discovery {
    /// Loads the watchlist and wires the coordinators to `catalog`.
    ///
    /// # Errors
    /// - `CinescopeError::Watchlist` - If the watchlist backend cannot be read
    pub async fn init(
        config: CinescopeConfig,
        catalog: Arc<dyn CatalogProvider>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let watchlist = WatchlistStore::open(storage, config.storage.watchlist_key.clone()).await?;
        let playback = PlaybackResolver::new(config.playback.providers.clone());

        info!(
            watchlist = watchlist.len(),
            providers = playback.table().providers.len(),
            "Discovery session ready"
        );

        Ok(Self {
            watchlist,
            details: DetailAggregator::new(Arc::clone(&catalog)),
            episodes: EpisodeCache::new(Arc::clone(&catalog)),
            search: SearchSession::new(catalog),
            playback,
            config,
        })
    }

    /// Opens the detail view and, for a series, the episode cache.
    ///
    /// The first listed season starts loading as soon as the details are in.
    pub async fn open_details(&self, identity: MediaIdentity) -> Resolution<DetailState> {
        let resolution = self.details.open(identity).await;

        match resolution.as_current() {
            Some(DetailState::Ready { detail, .. }) if detail.identity().is_series() => {
                self.episodes.open_show(identity.id, &detail.seasons);
            }
            Some(_) => self.episodes.close(),
            None => {}
        }

        resolution
    }

    /// Playback candidates for an item, in provider order.
    pub fn play(
        &self,
        identity: MediaIdentity,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Vec<PlaybackCandidate> {
        self.playback.resolve(identity, season, episode)
    }

    /// Saves or unsaves an item; returns whether it is now saved.
    ///
    /// # Errors
    /// - `CinescopeError::Watchlist` - If the change could not be persisted
    pub async fn toggle_watchlist(&mut self, item: &MediaSummary) -> Result<bool> {
        Ok(self.watchlist.toggle(item.clone(), item.identity).await?)
    }

    /// Image URL under the configured image host.
    pub fn image_url(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        image_url(&self.config.catalog.image_base_url, path, size)
    }

    pub fn config(&self) -> &CinescopeConfig {
        &self.config
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn details(&self) -> &DetailAggregator {
        &self.details
    }

    pub fn episodes(&self) -> &EpisodeCache {
        &self.episodes
    }

    pub fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    pub fn watchlist_mut(&mut self) -> &mut WatchlistStore {
        &mut self.watchlist
    }

    pub fn playback(&self) -> &PlaybackResolver {
        &self.playback
    }

    /// Closes open views and writes any unsaved watchlist changes.
    ///
    /// # Errors
    /// - `CinescopeError::Watchlist` - If pending changes could not be written
    pub async fn shutdown(mut self) -> Result<()> {
        self.details.close();
        self.episodes.close();
        self.watchlist.flush().await?;
        info!("Discovery session closed");
        Ok(())
    }
}

/// Catalog provider selected by configuration.
///
/// # Errors
/// - `CinescopeError::Catalog` - If no API key is configured for the live catalog
pub fn catalog_from_config(
    config: &CatalogConfig,
    demo: bool,
) -> Result<Arc<dyn CatalogProvider>> {
    if demo {
        info!("Using offline demo catalog");
        return Ok(Arc::new(DemoCatalog::new()));
    }

    let catalog = TmdbCatalog::with_config(
        config.base_url.clone(),
        config.api_key.clone(),
        config.request_timeout,
        config.language.clone(),
    )?;
    Ok(Arc::new(catalog))
}

/// File-backed store in the configured data directory.
pub fn storage_from_config(config: &StorageConfig) -> Arc<dyn KeyValueStore> {
    Arc::new(FileKeyValueStore::new(&config.data_dir).with_temp_suffix(config.temp_file_suffix))
}

#[cfg(test)]
mod tests {
    use cinescope_catalog::CatalogError;

    use super::*;
    use crate::watchlist::MemoryKeyValueStore;

    async fn demo_session() -> Discovery {
        Discovery::init(
            CinescopeConfig::default(),
            Arc::new(DemoCatalog::new()),
            Arc::new(MemoryKeyValueStore::new()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_opening_series_prepares_episode_cache() {
        let session = demo_session().await;
        let show = MediaIdentity::series(90228);

        let resolution = session.open_details(show).await;
        assert!(matches!(resolution, Resolution::Current(DetailState::Ready { .. })));
        assert_eq!(session.episodes().current_show(), Some(90228));
        assert_eq!(session.episodes().selected_season(), Some(0));

        session.open_details(MediaIdentity::movie(438631)).await;
        assert_eq!(session.episodes().current_show(), None);
    }

    #[tokio::test]
    async fn test_toggle_watchlist_from_summary() {
        let mut session = demo_session().await;
        let resolution = session.open_details(MediaIdentity::movie(841)).await;
        let Some(DetailState::Ready { detail, .. }) = resolution.into_current() else {
            panic!("expected ready state");
        };

        assert!(session.toggle_watchlist(&detail.summary).await.unwrap());
        assert!(session.watchlist().contains(841));
        assert!(!session.toggle_watchlist(&detail.summary).await.unwrap());
        session.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_image_url_uses_configured_host() {
        let session = demo_session().await;
        assert_eq!(
            session.image_url(Some("/a.jpg"), ImageSize::W500).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/a.jpg")
        );
        assert_eq!(session.image_url(None, ImageSize::Original), None);
    }

    #[test]
    fn test_live_catalog_requires_api_key() {
        let result = catalog_from_config(&CatalogConfig::default(), false);
        assert!(matches!(
            result,
            Err(crate::CinescopeError::Catalog(CatalogError::MissingCredentials))
        ));
        assert!(catalog_from_config(&CatalogConfig::default(), true).is_ok());
    }
}
