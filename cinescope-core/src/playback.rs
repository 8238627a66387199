//! Playback provider resolution.
//!
//! Each provider is a pair of URL templates, one for movies and one for
//! series episodes. Resolving an identity renders every template in table
//! order; nothing is fetched or checked for reachability.

use std::collections::HashSet;
use std::path::Path;

use cinescope_catalog::{MediaIdentity, MediaType};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Season used when a series is played without an explicit selection.
pub const DEFAULT_SEASON: u32 = 1;
/// Episode used when a series is played without an explicit selection.
pub const DEFAULT_EPISODE: u32 = 1;

const PLACEHOLDERS: [&str; 4] = ["id", "type", "season", "episode"];
const TABLE_VERSION: u32 = 1;

/// URL templates of one embed provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTemplate {
    pub name: String,
    pub movie_url: String,
    pub series_url: String,
}

impl ProviderTemplate {
    pub fn new(
        name: impl Into<String>,
        movie_url: impl Into<String>,
        series_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            movie_url: movie_url.into(),
            series_url: series_url.into(),
        }
    }

    fn template_for(&self, media_type: MediaType) -> &str {
        match media_type {
            MediaType::Movie => &self.movie_url,
            MediaType::Series => &self.series_url,
        }
    }
}

/// Ordered provider list, stored as `{"version": 1, "providers": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTable {
    #[serde(default = "table_version")]
    pub version: u32,
    pub providers: Vec<ProviderTemplate>,
}

fn table_version() -> u32 {
    TABLE_VERSION
}

impl Default for ProviderTable {
    fn default() -> Self {
        Self {
            version: TABLE_VERSION,
            providers: vec![
                ProviderTemplate::new(
                    "Vidora",
                    "https://vidora.su/movie/{id}",
                    "https://vidora.su/tv/{id}/{season}/{episode}",
                ),
                ProviderTemplate::new(
                    "Videasy",
                    "https://player.videasy.net/movie/{id}",
                    "https://player.videasy.net/tv/{id}/{season}/{episode}?nextEpisode=true&episodeSelector=true",
                ),
                ProviderTemplate::new(
                    "AutoEmbed",
                    "https://player.autoembed.cc/embed/movie/{id}",
                    "https://player.autoembed.cc/embed/tv/{id}/{season}/{episode}",
                ),
                ProviderTemplate::new(
                    "VidLink",
                    "https://vidlink.pro/movie/{id}",
                    "https://vidlink.pro/tv/{id}/{season}/{episode}",
                ),
            ],
        }
    }
}

impl ProviderTable {
    /// Parses and validates a JSON provider table.
    ///
    /// # Errors
    /// - `ConfigError::ProviderFile` - If the JSON does not describe a table
    /// - Any error of [`ProviderTable::validate`]
    pub fn from_json(source: &str, origin: &Path) -> Result<Self, ConfigError> {
        let table: ProviderTable =
            serde_json::from_str(source).map_err(|e| ConfigError::ProviderFile {
                path: origin.to_path_buf(),
                reason: e.to_string(),
            })?;
        table.validate()?;
        Ok(table)
    }

    /// Reads a provider table file.
    ///
    /// # Errors
    /// - `ConfigError::ProviderFile` - If the file cannot be read or parsed
    /// - Any error of [`ProviderTable::validate`]
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let source =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ConfigError::ProviderFile {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
        Self::from_json(&source, path)
    }

    /// Checks names are unique and every template renders a parseable URL.
    ///
    /// # Errors
    /// - `ConfigError::EmptyProviderTable` - If there are no providers
    /// - `ConfigError::DuplicateProvider` - If two providers share a name
    /// - `ConfigError::UnknownPlaceholder` - If a template uses an unsupported placeholder
    /// - `ConfigError::InvalidTemplate` - If a rendered template is not a URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::EmptyProviderTable);
        }

        let mut names = HashSet::new();
        for provider in &self.providers {
            if !names.insert(provider.name.as_str()) {
                return Err(ConfigError::DuplicateProvider {
                    name: provider.name.clone(),
                });
            }

            for media_type in [MediaType::Movie, MediaType::Series] {
                let template = provider.template_for(media_type);
                if let Some(unknown) =
                    placeholders(template).find(|name| !PLACEHOLDERS.contains(name))
                {
                    return Err(ConfigError::UnknownPlaceholder {
                        provider: provider.name.clone(),
                        placeholder: unknown.to_string(),
                    });
                }

                let sample = render(
                    template,
                    MediaIdentity {
                        id: 1,
                        media_type,
                    },
                    DEFAULT_SEASON,
                    DEFAULT_EPISODE,
                );
                url::Url::parse(&sample).map_err(|e| ConfigError::InvalidTemplate {
                    provider: provider.name.clone(),
                    reason: e.to_string(),
                })?;
            }
        }

        Ok(())
    }
}

/// Names inside `{...}` tokens of a template.
fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    let mut rest = template;
    std::iter::from_fn(move || {
        let open = rest.find('{')?;
        let after = &rest[open + 1..];
        let close = after.find('}')?;
        rest = &after[close + 1..];
        Some(&after[..close])
    })
}

fn render(template: &str, identity: MediaIdentity, season: u32, episode: u32) -> String {
    template
        .replace("{id}", &identity.id.to_string())
        .replace("{type}", identity.media_type.catalog_segment())
        .replace("{season}", &season.to_string())
        .replace("{episode}", &episode.to_string())
}

/// One playable URL offered to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackCandidate {
    pub provider_name: String,
    pub url: String,
}

/// Renders playback URLs from the provider table.
#[derive(Debug, Clone, Default)]
pub struct PlaybackResolver {
    table: ProviderTable,
}

impl PlaybackResolver {
    pub fn new(table: ProviderTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ProviderTable {
        &self.table
    }

    /// One candidate per provider, in table order.
    ///
    /// Season and episode only affect series; they default to 1 when absent.
    pub fn resolve(
        &self,
        identity: MediaIdentity,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Vec<PlaybackCandidate> {
        let season = season.unwrap_or(DEFAULT_SEASON);
        let episode = episode.unwrap_or(DEFAULT_EPISODE);

        self.table
            .providers
            .iter()
            .map(|provider| PlaybackCandidate {
                provider_name: provider.name.clone(),
                url: render(
                    provider.template_for(identity.media_type),
                    identity,
                    season,
                    episode,
                ),
            })
            .collect()
    }

    /// Candidate of the first provider, which the player starts with.
    pub fn primary(
        &self,
        identity: MediaIdentity,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Option<PlaybackCandidate> {
        self.resolve(identity, season, episode).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_urls_in_table_order() {
        let resolver = PlaybackResolver::default();
        let candidates = resolver.resolve(MediaIdentity::movie(42), None, None);

        let names: Vec<_> = candidates
            .iter()
            .map(|c| c.provider_name.as_str())
            .collect();
        assert_eq!(names, ["Vidora", "Videasy", "AutoEmbed", "VidLink"]);
        assert_eq!(candidates[0].url, "https://vidora.su/movie/42");
        assert_eq!(
            candidates[2].url,
            "https://player.autoembed.cc/embed/movie/42"
        );
    }

    #[test]
    fn test_series_url_substitutes_season_and_episode() {
        let resolver = PlaybackResolver::default();
        let candidates = resolver.resolve(MediaIdentity::series(7), Some(2), Some(5));

        assert_eq!(candidates[0].url, "https://vidora.su/tv/7/2/5");
        assert_eq!(
            candidates[1].url,
            "https://player.videasy.net/tv/7/2/5?nextEpisode=true&episodeSelector=true"
        );
    }

    #[test]
    fn test_series_defaults_to_first_episode() {
        let resolver = PlaybackResolver::default();
        let primary = resolver
            .primary(MediaIdentity::series(1399), None, None)
            .unwrap();
        assert_eq!(primary.url, "https://vidora.su/tv/1399/1/1");
    }

    #[test]
    fn test_movie_ignores_episode_arguments() {
        let resolver = PlaybackResolver::default();
        let primary = resolver
            .primary(MediaIdentity::movie(42), Some(3), Some(9))
            .unwrap();
        assert_eq!(primary.url, "https://vidora.su/movie/42");
    }

    #[test]
    fn test_type_placeholder_uses_catalog_segment() {
        let table = ProviderTable {
            version: 1,
            providers: vec![ProviderTemplate::new(
                "Generic",
                "https://embed.example/{type}/{id}",
                "https://embed.example/{type}/{id}/{season}-{episode}",
            )],
        };
        table.validate().unwrap();

        let resolver = PlaybackResolver::new(table);
        let series = resolver.primary(MediaIdentity::series(5), Some(1), Some(2));
        assert_eq!(series.unwrap().url, "https://embed.example/tv/5/1-2");
    }

    #[test]
    fn test_validation_rejects_unknown_placeholder() {
        let table = ProviderTable {
            version: 1,
            providers: vec![ProviderTemplate::new(
                "Broken",
                "https://embed.example/movie/{imdb}",
                "https://embed.example/tv/{id}",
            )],
        };
        let err = table.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownPlaceholder { ref placeholder, .. } if placeholder == "imdb"
        ));
    }

    #[test]
    fn test_validation_rejects_relative_template() {
        let table = ProviderTable {
            version: 1,
            providers: vec![ProviderTemplate::new("Relative", "/movie/{id}", "/tv/{id}")],
        };
        assert!(matches!(
            table.validate(),
            Err(ConfigError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_duplicates_and_empty() {
        assert!(matches!(
            ProviderTable {
                version: 1,
                providers: Vec::new(),
            }
            .validate(),
            Err(ConfigError::EmptyProviderTable)
        ));

        let mut table = ProviderTable::default();
        table.providers.push(table.providers[0].clone());
        assert!(matches!(
            table.validate(),
            Err(ConfigError::DuplicateProvider { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.json");
        tokio::fs::write(
            &path,
            r#"{"providers":[{"name":"Solo","movie_url":"https://solo.example/m/{id}","series_url":"https://solo.example/s/{id}/{season}/{episode}"}]}"#,
        )
        .await
        .unwrap();

        let table = ProviderTable::load(&path).await.unwrap();
        assert_eq!(table.version, 1);
        assert_eq!(table.providers.len(), 1);

        let missing = ProviderTable::load(&dir.path().join("absent.json")).await;
        assert!(matches!(missing, Err(ConfigError::ProviderFile { .. })));
    }
}
