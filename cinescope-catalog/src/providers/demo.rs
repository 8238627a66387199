//! Demo provider with a small offline catalog.
//!
//! Serves a fixed dataset without external API calls so the full discovery
//! workflow can be exercised without a TMDB key.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::CatalogProvider;
use crate::errors::CatalogError;
use crate::types::{
    CastMember, Episode, Genre, HitKind, MediaDetail, MediaIdentity, MediaSummary, SearchHit,
    SearchPage, Season, Trailer,
};

const PAGE_SIZE: usize = 20;

/// In-memory catalog for development.
#[derive(Debug, Clone)]
pub struct DemoCatalog {
    titles: Vec<MediaDetail>,
    people: Vec<SearchHit>,
    episodes: HashMap<(u64, u32), Vec<Episode>>,
}

impl DemoCatalog {
    /// Creates the demo catalog with its built-in dataset.
    pub fn new() -> Self {
        let titles = vec![
            movie(
                438631,
                "Dune",
                (2021, 9, 15),
                155,
                Some("/d5NXSklXo0qyIYkgV94XAgMIckC.jpg"),
                Some("/jYEW5xZkZk2WTrdbMGAPFuBqbDc.jpg"),
                7.8,
                "Paul Atreides travels to the most dangerous planet in the universe.",
            ),
            movie(
                693134,
                "Dune: Part Two",
                (2024, 2, 27),
                167,
                Some("/1pdfLvkbY9ohJlCjQH2CZjjYVvJ.jpg"),
                Some("/xOMo8BRK7PfcJv9JCnx7s5hj0PX.jpg"),
                8.2,
                "Paul Atreides unites with Chani and the Fremen.",
            ),
            movie(
                841,
                "Dune",
                (1984, 12, 14),
                137,
                Some("/a3nDwAnKAl0jsSmsGaen9XxYSJq.jpg"),
                None,
                6.3,
                "In the year 10,191 the most precious substance is the spice melange.",
            ),
            series(
                90228,
                "Dune: Prophecy",
                (2024, 11, 17),
                Some("/rzRb63TldOKdKydCvWJM8B6EkPM.jpg"),
                Some("/lNmhSbD4TCdixOhUCRwTBIfppyQ.jpg"),
                7.4,
                "Two Harkonnen sisters combat forces that threaten the future of humankind.",
                &[(0, "Specials", 1), (1, "Season 1", 6)],
            ),
            series(
                1676,
                "Frank Herbert's Dune",
                (2000, 12, 3),
                None,
                None,
                6.9,
                "A miniseries adaptation of the novel.",
                &[(1, "Miniseries", 3)],
            ),
            series(
                1399,
                "Game of Thrones",
                (2011, 4, 17),
                Some("/1XS1oqL89opfnbLl8WnZY1O1uJx.jpg"),
                Some("/2OMB0ynKlyIenMJWI2Dy9IWT4c.jpg"),
                8.5,
                "Seven noble families fight for control of the mythical land of Westeros.",
                &[(0, "Specials", 2), (1, "Season 1", 10), (2, "Season 2", 10)],
            ),
        ];

        let people = vec![SearchHit {
            id: 1190668,
            kind: HitKind::Person,
            title: "Timothée Chalamet (Dune)".to_string(),
            release_year: None,
            poster_path: Some("/BE2sdjpgsa2rNTFa66f7upkaOP.jpg".to_string()),
            backdrop_path: None,
            rating: None,
            overview: None,
        }];

        let mut episodes = HashMap::new();
        for title in titles.iter().filter(|t| t.identity().is_series()) {
            for season in &title.seasons {
                episodes.insert(
                    (title.identity().id, season.season_number),
                    season_episodes(&title.summary.title, season),
                );
            }
        }

        Self {
            titles,
            people,
            episodes,
        }
    }

    fn find(&self, identity: MediaIdentity) -> Option<&MediaDetail> {
        self.titles.iter().find(|t| t.identity() == identity)
    }
}

impl Default for DemoCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogProvider for DemoCatalog {
    async fn search_media(&self, term: &str, page: u32) -> Result<SearchPage, CatalogError> {
        let needle = term.to_lowercase();

        let mut hits: Vec<SearchHit> = self
            .titles
            .iter()
            .filter(|t| t.summary.title.to_lowercase().contains(&needle))
            .map(|t| summary_hit(&t.summary))
            .collect();
        hits.extend(
            self.people
                .iter()
                .filter(|p| p.title.to_lowercase().contains(&needle))
                .cloned(),
        );

        let total_results = hits.len();
        let total_pages = total_results.div_ceil(PAGE_SIZE);
        let offset = (page.max(1) as usize - 1) * PAGE_SIZE;

        Ok(SearchPage {
            results: hits.into_iter().skip(offset).take(PAGE_SIZE).collect(),
            page,
            total_results: total_results as u32,
            total_pages: total_pages as u32,
        })
    }

    async fn media_details(&self, identity: MediaIdentity) -> Result<MediaDetail, CatalogError> {
        self.find(identity)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                what: identity.to_string(),
            })
    }

    async fn recommendations(
        &self,
        identity: MediaIdentity,
    ) -> Result<Vec<MediaSummary>, CatalogError> {
        if self.find(identity).is_none() {
            return Err(CatalogError::NotFound {
                what: identity.to_string(),
            });
        }

        Ok(self
            .titles
            .iter()
            .filter(|t| {
                t.identity() != identity && t.identity().media_type == identity.media_type
            })
            .map(|t| t.summary.clone())
            .collect())
    }

    async fn season_episodes(
        &self,
        show_id: u64,
        season_number: u32,
    ) -> Result<Vec<Episode>, CatalogError> {
        self.episodes
            .get(&(show_id, season_number))
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                what: format!("series:{show_id} season {season_number}"),
            })
    }
}

fn summary_hit(summary: &MediaSummary) -> SearchHit {
    SearchHit {
        id: summary.identity.id,
        kind: if summary.identity.is_series() {
            HitKind::Series
        } else {
            HitKind::Movie
        },
        title: summary.title.clone(),
        release_year: summary.release_year,
        poster_path: summary.poster_path.clone(),
        backdrop_path: summary.backdrop_path.clone(),
        rating: summary.rating,
        overview: summary.overview.clone(),
    }
}

fn date((year, month, day): (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn base_detail(
    identity: MediaIdentity,
    title: &str,
    released: (i32, u32, u32),
    poster: Option<&str>,
    backdrop: Option<&str>,
    rating: f32,
    overview: &str,
) -> MediaDetail {
    MediaDetail {
        summary: MediaSummary {
            identity,
            title: title.to_string(),
            release_year: Some(released.0),
            poster_path: poster.map(str::to_string),
            backdrop_path: backdrop.map(str::to_string),
            rating: Some(rating),
            overview: Some(overview.to_string()),
        },
        release_date: date(released),
        runtime_minutes: None,
        episode_runtimes: Vec::new(),
        genres: vec![Genre {
            id: 878,
            name: "Science Fiction".to_string(),
        }],
        cast: vec![CastMember {
            id: 1190668,
            name: "Timothée Chalamet".to_string(),
            character: Some("Paul Atreides".to_string()),
            profile_path: None,
        }],
        trailers: vec![Trailer {
            key: format!("demo-{}", identity.id),
            site: "YouTube".to_string(),
            kind: "Trailer".to_string(),
            name: format!("{title} Official Trailer"),
        }],
        seasons: Vec::new(),
        tagline: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn movie(
    id: u64,
    title: &str,
    released: (i32, u32, u32),
    runtime: u32,
    poster: Option<&str>,
    backdrop: Option<&str>,
    rating: f32,
    overview: &str,
) -> MediaDetail {
    let mut detail = base_detail(
        MediaIdentity::movie(id),
        title,
        released,
        poster,
        backdrop,
        rating,
        overview,
    );
    detail.runtime_minutes = Some(runtime);
    detail
}

#[allow(clippy::too_many_arguments)]
fn series(
    id: u64,
    title: &str,
    released: (i32, u32, u32),
    poster: Option<&str>,
    backdrop: Option<&str>,
    rating: f32,
    overview: &str,
    seasons: &[(u32, &str, u32)],
) -> MediaDetail {
    let mut detail = base_detail(
        MediaIdentity::series(id),
        title,
        released,
        poster,
        backdrop,
        rating,
        overview,
    );
    detail.episode_runtimes = vec![60];
    detail.seasons = seasons
        .iter()
        .map(|&(season_number, name, episode_count)| Season {
            season_number,
            name: name.to_string(),
            episode_count,
            air_date: detail.release_date,
            poster_path: None,
        })
        .collect();
    detail
}

fn season_episodes(show: &str, season: &Season) -> Vec<Episode> {
    (1..=season.episode_count)
        .map(|episode_number| Episode {
            episode_number,
            name: format!("{show} S{:02}E{episode_number:02}", season.season_number),
            overview: String::new(),
            still_path: None,
            air_date: season.air_date,
            runtime_minutes: Some(60),
        })
        .collect()
}
