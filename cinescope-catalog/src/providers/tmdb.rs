//! TMDB v3 catalog provider.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::CatalogProvider;
use crate::errors::CatalogError;
use crate::types::{
    CastMember, Episode, Genre, HitKind, MediaDetail, MediaIdentity, MediaSummary, MediaType,
    SearchHit, SearchPage, Season, Trailer, year_of,
};

/// Default TMDB API root.
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Catalog provider backed by the TMDB REST API.
///
/// The API key is supplied by configuration and sent as a query parameter on
/// every request.
#[derive(Debug, Clone)]
pub struct TmdbCatalog {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbListResponse {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    results: Vec<TmdbListItem>,
    #[serde(default)]
    total_results: u32,
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct TmdbListItem {
    id: u64,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbDetailResponse {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
    overview: Option<String>,
    tagline: Option<String>,
    runtime: Option<u32>,
    #[serde(default)]
    episode_run_time: Vec<u32>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    seasons: Vec<TmdbSeason>,
    credits: Option<TmdbCredits>,
    videos: Option<TmdbVideos>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeason {
    season_number: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    episode_count: u32,
    air_date: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideos {
    #[serde(default)]
    results: Vec<TmdbVideo>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideo {
    key: String,
    site: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonResponse {
    #[serde(default)]
    episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisode {
    episode_number: u32,
    #[serde(default)]
    name: String,
    overview: Option<String>,
    still_path: Option<String>,
    air_date: Option<String>,
    runtime: Option<u32>,
}

impl TmdbCatalog {
    /// Create TMDB provider against the public API with default timeout.
    ///
    /// # Errors
    /// - `CatalogError::MissingCredentials` - If the key is empty
    pub fn new(api_key: impl Into<String>) -> Result<Self, CatalogError> {
        Self::with_config(
            DEFAULT_BASE_URL.to_string(),
            Some(api_key.into()),
            Duration::from_secs(15),
            None,
        )
    }

    /// Create TMDB provider with custom configuration.
    ///
    /// # Errors
    /// - `CatalogError::MissingCredentials` - If no non-empty key is given
    /// - `CatalogError::Network` - If the HTTP client cannot be built
    pub fn with_config(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
        language: Option<String>,
    ) -> Result<Self, CatalogError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(CatalogError::MissingCredentials)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Network {
                reason: format!("HTTP client setup failed: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            language,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        extra: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{endpoint}", self.base_url);

        let mut params: Vec<(&str, String)> = vec![("api_key", self.api_key.clone())];
        if let Some(ref language) = self.language {
            params.push(("language", language.clone()));
        }
        params.extend(extra.iter().cloned());

        tracing::debug!(endpoint, "Catalog request");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| CatalogError::Network {
                reason: format!("TMDB request failed: {e}"),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound {
                what: endpoint.to_string(),
            });
        }
        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), "Catalog returned error status");
            return Err(CatalogError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| CatalogError::Parse {
            reason: format!("TMDB JSON parsing failed for {endpoint}: {e}"),
        })
    }

    /// Classify a list item. Recommendation lists omit `media_type`; the
    /// fallback type covers them.
    fn classify(item: &TmdbListItem, fallback: Option<MediaType>) -> HitKind {
        match item.media_type.as_deref() {
            Some("movie") => HitKind::Movie,
            Some("tv") => HitKind::Series,
            Some("person") => HitKind::Person,
            Some(_) => HitKind::Other,
            None => match fallback {
                Some(MediaType::Movie) => HitKind::Movie,
                Some(MediaType::Series) => HitKind::Series,
                None if item.first_air_date.is_some() => HitKind::Series,
                None => HitKind::Movie,
            },
        }
    }

    fn convert_hit(item: TmdbListItem, fallback: Option<MediaType>) -> SearchHit {
        let kind = Self::classify(&item, fallback);
        let date = item.release_date.as_deref().or(item.first_air_date.as_deref());
        SearchHit {
            id: item.id,
            kind,
            title: item.title.or(item.name).unwrap_or_default(),
            release_year: year_of(parse_date(date)),
            poster_path: non_empty(item.poster_path),
            backdrop_path: non_empty(item.backdrop_path),
            rating: item.vote_average,
            overview: non_empty(item.overview),
        }
    }

    fn convert_detail(identity: MediaIdentity, detail: TmdbDetailResponse) -> MediaDetail {
        let release_date = parse_date(
            detail
                .release_date
                .as_deref()
                .or(detail.first_air_date.as_deref()),
        );

        let summary = MediaSummary {
            identity: MediaIdentity {
                id: detail.id,
                media_type: identity.media_type,
            },
            title: detail.title.or(detail.name).unwrap_or_default(),
            release_year: year_of(release_date),
            poster_path: non_empty(detail.poster_path),
            backdrop_path: non_empty(detail.backdrop_path),
            rating: detail.vote_average,
            overview: non_empty(detail.overview),
        };

        let seasons = detail
            .seasons
            .into_iter()
            .map(|season| Season {
                season_number: season.season_number,
                name: season.name,
                episode_count: season.episode_count,
                air_date: parse_date(season.air_date.as_deref()),
                poster_path: non_empty(season.poster_path),
            })
            .collect();

        let trailers = detail
            .videos
            .map(|videos| videos.results)
            .unwrap_or_default()
            .into_iter()
            .map(|video| Trailer {
                key: video.key,
                site: video.site,
                kind: video.kind,
                name: video.name,
            })
            .collect();

        MediaDetail {
            summary,
            release_date,
            runtime_minutes: detail.runtime.filter(|minutes| *minutes > 0),
            episode_runtimes: detail.episode_run_time,
            genres: detail.genres,
            cast: detail.credits.map(|credits| credits.cast).unwrap_or_default(),
            trailers,
            seasons,
            tagline: non_empty(detail.tagline),
        }
    }
}

#[async_trait]
impl CatalogProvider for TmdbCatalog {
    async fn search_media(&self, term: &str, page: u32) -> Result<SearchPage, CatalogError> {
        let response: TmdbListResponse = self
            .get_json(
                "/search/multi",
                &[
                    ("query", term.to_string()),
                    ("page", page.to_string()),
                    ("include_adult", "false".to_string()),
                ],
            )
            .await?;

        Ok(SearchPage {
            page: if response.page == 0 { page } else { response.page },
            results: response
                .results
                .into_iter()
                .map(|item| Self::convert_hit(item, None))
                .collect(),
            total_results: response.total_results,
            total_pages: response.total_pages,
        })
    }

    async fn media_details(&self, identity: MediaIdentity) -> Result<MediaDetail, CatalogError> {
        let endpoint = format!("/{}/{}", identity.media_type.catalog_segment(), identity.id);
        let detail: TmdbDetailResponse = self
            .get_json(
                &endpoint,
                &[("append_to_response", "credits,videos".to_string())],
            )
            .await?;

        Ok(Self::convert_detail(identity, detail))
    }

    async fn recommendations(
        &self,
        identity: MediaIdentity,
    ) -> Result<Vec<MediaSummary>, CatalogError> {
        let endpoint = format!(
            "/{}/{}/recommendations",
            identity.media_type.catalog_segment(),
            identity.id
        );
        let response: TmdbListResponse = self.get_json(&endpoint, &[]).await?;

        // Recommendations always share the type of the item they were requested for.
        Ok(response
            .results
            .into_iter()
            .map(|mut item| {
                item.media_type = None;
                Self::convert_hit(item, Some(identity.media_type))
            })
            .filter_map(SearchHit::into_summary)
            .collect())
    }

    async fn season_episodes(
        &self,
        show_id: u64,
        season_number: u32,
    ) -> Result<Vec<Episode>, CatalogError> {
        let endpoint = format!("/tv/{show_id}/season/{season_number}");
        let response: TmdbSeasonResponse = self.get_json(&endpoint, &[]).await?;

        Ok(response
            .episodes
            .into_iter()
            .map(|episode| Episode {
                episode_number: episode.episode_number,
                name: episode.name,
                overview: episode.overview.unwrap_or_default(),
                still_path: non_empty(episode.still_path),
                air_date: parse_date(episode.air_date.as_deref()),
                runtime_minutes: episode.runtime,
            })
            .collect())
    }
}

/// TMDB sends `""` for unknown dates; those become `None`.
fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.filter(|value| !value.is_empty())
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_item(json: &str) -> TmdbListItem {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let result = TmdbCatalog::with_config(
            DEFAULT_BASE_URL.to_string(),
            Some("   ".to_string()),
            Duration::from_secs(5),
            None,
        );
        assert_eq!(result.unwrap_err(), CatalogError::MissingCredentials);
    }

    #[test]
    fn test_parse_date_handles_blank_values() {
        assert_eq!(
            parse_date(Some("2021-09-15")),
            NaiveDate::from_ymd_opt(2021, 9, 15)
        );
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("soon")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn test_convert_search_hits() {
        let movie = list_item(
            r#"{"id":438631,"media_type":"movie","title":"Dune","release_date":"2021-09-15",
                "poster_path":"/d5NXSklXo0qyIYkgV94XAgMIckC.jpg","backdrop_path":null,"vote_average":7.8}"#,
        );
        let hit = TmdbCatalog::convert_hit(movie, None);
        assert_eq!(hit.kind, HitKind::Movie);
        assert_eq!(hit.title, "Dune");
        assert_eq!(hit.release_year, Some(2021));
        assert!(hit.has_image());

        let series = list_item(
            r#"{"id":90228,"media_type":"tv","name":"Dune: Prophecy","first_air_date":"2024-11-17"}"#,
        );
        let hit = TmdbCatalog::convert_hit(series, None);
        assert_eq!(hit.kind, HitKind::Series);
        assert_eq!(hit.title, "Dune: Prophecy");

        let person = list_item(r#"{"id":1190668,"media_type":"person","name":"Timothée Chalamet"}"#);
        assert_eq!(TmdbCatalog::convert_hit(person, None).kind, HitKind::Person);
    }

    #[test]
    fn test_missing_media_type_inferred_from_air_date() {
        let item = list_item(r#"{"id":1,"name":"Show","first_air_date":"2020-01-01"}"#);
        assert_eq!(TmdbCatalog::classify(&item, None), HitKind::Series);

        let item = list_item(r#"{"id":2,"title":"Film","release_date":"2020-01-01"}"#);
        assert_eq!(TmdbCatalog::classify(&item, None), HitKind::Movie);
        assert_eq!(
            TmdbCatalog::classify(&item, Some(MediaType::Series)),
            HitKind::Series
        );
    }

    #[test]
    fn test_convert_series_detail_keeps_specials() {
        let detail: TmdbDetailResponse = serde_json::from_str(
            r#"{
                "id": 1399,
                "name": "Game of Thrones",
                "first_air_date": "2011-04-17",
                "episode_run_time": [60],
                "genres": [{"id": 18, "name": "Drama"}],
                "seasons": [
                    {"season_number": 0, "name": "Specials", "episode_count": 14, "air_date": ""},
                    {"season_number": 1, "name": "Season 1", "episode_count": 10, "air_date": "2011-04-17"}
                ],
                "credits": {"cast": [{"id": 22970, "name": "Peter Dinklage", "character": "Tyrion Lannister"}]},
                "videos": {"results": [{"key": "abc", "site": "YouTube", "type": "Trailer", "name": "Official Trailer"}]}
            }"#,
        )
        .unwrap();

        let detail = TmdbCatalog::convert_detail(MediaIdentity::series(1399), detail);
        assert_eq!(detail.identity(), MediaIdentity::series(1399));
        assert_eq!(detail.seasons.len(), 2);
        assert_eq!(detail.first_season().map(|s| s.season_number), Some(0));
        assert_eq!(detail.seasons[0].air_date, None);
        assert_eq!(detail.runtime_label().as_deref(), Some("~60 minutes"));
        assert_eq!(detail.cast[0].character.as_deref(), Some("Tyrion Lannister"));
        assert_eq!(detail.primary_trailer().map(|t| t.key.as_str()), Some("abc"));
        assert_eq!(detail.genre_names(), "Drama");
    }
}
