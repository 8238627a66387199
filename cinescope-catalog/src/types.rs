//! Media data model shared across Cinescope.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Kind of playable media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Feature film
    Movie,
    /// Serialized content with seasons and episodes
    #[serde(alias = "tv")]
    Series,
}

impl MediaType {
    /// Path segment the catalog provider uses for this type.
    pub fn catalog_segment(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Series => write!(f, "series"),
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "series" | "tv" => Ok(MediaType::Series),
            _ => Err(format!("Invalid media type: {s}")),
        }
    }
}

/// Composite key of a catalog item.
///
/// The same numeric id may name a movie and a series independently, so
/// identity-keyed structures must compare both fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaIdentity {
    /// Catalog provider id
    pub id: u64,
    /// Movie or series
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

impl MediaIdentity {
    /// Identity of a movie.
    pub fn movie(id: u64) -> Self {
        Self {
            id,
            media_type: MediaType::Movie,
        }
    }

    /// Identity of a series.
    pub fn series(id: u64) -> Self {
        Self {
            id,
            media_type: MediaType::Series,
        }
    }

    /// Whether this identity names serialized content.
    pub fn is_series(&self) -> bool {
        self.media_type == MediaType::Series
    }
}

impl fmt::Display for MediaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.media_type, self.id)
    }
}

/// Display fields of a catalog item. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSummary {
    /// Composite catalog key
    pub identity: MediaIdentity,
    /// Movie title or series name
    pub title: String,
    /// Year of release or first air date
    #[serde(default)]
    pub release_year: Option<i32>,
    /// Poster image path
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Average rating on a 0-10 scale
    #[serde(default)]
    pub rating: Option<f32>,
    /// Plot overview, passed through unchanged
    #[serde(default)]
    pub overview: Option<String>,
}

impl MediaSummary {
    /// Whether a poster or backdrop is available.
    pub fn has_image(&self) -> bool {
        self.poster_path.is_some() || self.backdrop_path.is_some()
    }

    /// Wide image for hero banners: backdrop first, then poster.
    pub fn hero_image(&self) -> Option<&str> {
        self.backdrop_path
            .as_deref()
            .or(self.poster_path.as_deref())
    }

    /// Release year as shown to the user.
    pub fn display_year(&self) -> String {
        self.release_year
            .map(|year| year.to_string())
            .unwrap_or_else(|| "TBA".to_string())
    }

    /// Rating formatted as `7.8 / 10`.
    pub fn rating_label(&self) -> Option<String> {
        self.rating.map(|rating| format!("{rating:.1} / 10"))
    }
}

/// Genre reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    /// Provider genre id
    pub id: u64,
    /// Display name
    pub name: String,
}

/// Credited cast member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    /// Provider person id
    pub id: u64,
    /// Performer name
    pub name: String,
    /// Role played
    #[serde(default)]
    pub character: Option<String>,
    /// Headshot image path
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Video reference attached to a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    /// Video key on the hosting site
    pub key: String,
    /// Hosting site, e.g. `YouTube`
    pub site: String,
    /// Video kind, e.g. `Trailer`, `Teaser`, `Featurette`
    pub kind: String,
    /// Display name
    pub name: String,
}

impl Trailer {
    /// Whether this is a playable trailer or teaser.
    pub fn is_trailer(&self) -> bool {
        matches!(self.kind.as_str(), "Trailer" | "Teaser")
    }

    /// Watch URL for YouTube-hosted videos.
    pub fn youtube_url(&self) -> Option<String> {
        (self.site == "YouTube").then(|| format!("https://www.youtube.com/watch?v={}", self.key))
    }
}

/// One season of a series. Season `0` holds specials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    /// Season number, `0` for specials
    pub season_number: u32,
    /// Display name from the provider
    pub name: String,
    /// Number of episodes in the season
    pub episode_count: u32,
    /// First air date
    #[serde(default)]
    pub air_date: Option<NaiveDate>,
    /// Season poster path
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl Season {
    /// Provider name, or `Season N` when the provider left it blank.
    pub fn label(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Season {}", self.season_number)
        } else {
            self.name.clone()
        }
    }
}

/// One episode within a (show, season).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Episode number, starting at 1
    pub episode_number: u32,
    /// Episode title
    pub name: String,
    /// Plot overview
    #[serde(default)]
    pub overview: String,
    /// Still image path
    #[serde(default)]
    pub still_path: Option<String>,
    /// Original air date
    #[serde(default)]
    pub air_date: Option<NaiveDate>,
    /// Runtime in minutes
    #[serde(default)]
    pub runtime_minutes: Option<u32>,
}

/// Full detail record backing a details view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDetail {
    /// Display fields shared with search results
    pub summary: MediaSummary,
    /// Release date (movies) or first air date (series)
    pub release_date: Option<NaiveDate>,
    /// Movie runtime in minutes
    pub runtime_minutes: Option<u32>,
    /// Typical episode runtimes for series
    pub episode_runtimes: Vec<u32>,
    /// Genres, passed through unchanged
    pub genres: Vec<Genre>,
    /// Cast, passed through unchanged
    pub cast: Vec<CastMember>,
    /// Attached videos
    pub trailers: Vec<Trailer>,
    /// Season list, empty for movies
    pub seasons: Vec<Season>,
    /// Marketing tagline
    pub tagline: Option<String>,
}

impl MediaDetail {
    /// Composite key of this item.
    pub fn identity(&self) -> MediaIdentity {
        self.summary.identity
    }

    /// First trailer or teaser, in provider order.
    pub fn primary_trailer(&self) -> Option<&Trailer> {
        self.trailers.iter().find(|trailer| trailer.is_trailer())
    }

    /// First entry of the season list, which may be the specials season.
    pub fn first_season(&self) -> Option<&Season> {
        self.seasons.first()
    }

    /// Runtime as shown to the user.
    pub fn runtime_label(&self) -> Option<String> {
        match self.summary.identity.media_type {
            MediaType::Movie => self.runtime_minutes.map(format_runtime),
            MediaType::Series => self
                .episode_runtimes
                .first()
                .map(|minutes| format!("~{minutes} minutes")),
        }
    }

    /// Comma-separated genre names.
    pub fn genre_names(&self) -> String {
        self.genres
            .iter()
            .map(|genre| genre.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Formats minutes as `2h 35m`.
pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Extracts the year of an optional date.
pub fn year_of(date: Option<NaiveDate>) -> Option<i32> {
    date.map(|date| date.year())
}

/// Classification of a raw search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitKind {
    /// Feature film
    Movie,
    /// Series
    Series,
    /// Person (actor, director)
    Person,
    /// Anything else the provider returns
    Other,
}

/// One unfiltered entry of a provider search page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Provider id
    pub id: u64,
    /// Result classification
    pub kind: HitKind,
    /// Title or name
    pub title: String,
    /// Year of release or first air date
    pub release_year: Option<i32>,
    /// Poster image path
    pub poster_path: Option<String>,
    /// Backdrop image path
    pub backdrop_path: Option<String>,
    /// Average rating
    pub rating: Option<f32>,
    /// Plot overview
    pub overview: Option<String>,
}

impl SearchHit {
    /// Media type for movie and series hits.
    pub fn media_type(&self) -> Option<MediaType> {
        match self.kind {
            HitKind::Movie => Some(MediaType::Movie),
            HitKind::Series => Some(MediaType::Series),
            HitKind::Person | HitKind::Other => None,
        }
    }

    /// Whether a poster or backdrop is available.
    pub fn has_image(&self) -> bool {
        self.poster_path.is_some() || self.backdrop_path.is_some()
    }

    /// Converts movie and series hits into summaries.
    pub fn into_summary(self) -> Option<MediaSummary> {
        let media_type = self.media_type()?;
        Some(MediaSummary {
            identity: MediaIdentity {
                id: self.id,
                media_type,
            },
            title: self.title,
            release_year: self.release_year,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            rating: self.rating,
            overview: self.overview,
        })
    }
}

/// One raw page of provider search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Unfiltered hits
    pub results: Vec<SearchHit>,
    /// Page number this response covers
    pub page: u32,
    /// Provider result count before any local filtering
    pub total_results: u32,
    /// Provider page count before any local filtering
    pub total_pages: u32,
}

impl SearchPage {
    /// Page with no hits.
    pub fn empty(page: u32) -> Self {
        Self {
            results: Vec::new(),
            page,
            total_results: 0,
            total_pages: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(poster: Option<&str>, backdrop: Option<&str>) -> MediaSummary {
        MediaSummary {
            identity: MediaIdentity::movie(438631),
            title: "Dune".to_string(),
            release_year: Some(2021),
            poster_path: poster.map(str::to_string),
            backdrop_path: backdrop.map(str::to_string),
            rating: Some(7.78),
            overview: None,
        }
    }

    #[test]
    fn test_identity_distinguishes_types() {
        assert_ne!(MediaIdentity::movie(7), MediaIdentity::series(7));
        assert_eq!(MediaIdentity::series(7).to_string(), "series:7");
    }

    #[test]
    fn test_media_type_parsing() {
        assert_eq!("tv".parse::<MediaType>(), Ok(MediaType::Series));
        assert_eq!("Movie".parse::<MediaType>(), Ok(MediaType::Movie));
        assert!("person".parse::<MediaType>().is_err());

        let parsed: MediaType = serde_json::from_str("\"tv\"").unwrap();
        assert_eq!(parsed, MediaType::Series);
        assert_eq!(serde_json::to_string(&MediaType::Series).unwrap(), "\"series\"");
    }

    #[test]
    fn test_hero_image_prefers_backdrop() {
        assert_eq!(summary(Some("/p.jpg"), Some("/b.jpg")).hero_image(), Some("/b.jpg"));
        assert_eq!(summary(Some("/p.jpg"), None).hero_image(), Some("/p.jpg"));
        assert!(!summary(None, None).has_image());
    }

    #[test]
    fn test_display_helpers() {
        let item = summary(None, None);
        assert_eq!(item.display_year(), "2021");
        assert_eq!(item.rating_label().as_deref(), Some("7.8 / 10"));
        assert_eq!(format_runtime(155), "2h 35m");
        assert_eq!(format_runtime(45), "0h 45m");
    }

    #[test]
    fn test_primary_trailer_skips_featurettes() {
        let video = |kind: &str, key: &str| Trailer {
            key: key.to_string(),
            site: "YouTube".to_string(),
            kind: kind.to_string(),
            name: kind.to_string(),
        };
        let detail = MediaDetail {
            summary: summary(None, None),
            release_date: None,
            runtime_minutes: Some(155),
            episode_runtimes: Vec::new(),
            genres: Vec::new(),
            cast: Vec::new(),
            trailers: vec![video("Featurette", "a"), video("Teaser", "b"), video("Trailer", "c")],
            seasons: Vec::new(),
            tagline: None,
        };

        let trailer = detail.primary_trailer().unwrap();
        assert_eq!(trailer.key, "b");
        assert_eq!(
            trailer.youtube_url().as_deref(),
            Some("https://www.youtube.com/watch?v=b")
        );
        assert_eq!(detail.runtime_label().as_deref(), Some("2h 35m"));
    }

    #[test]
    fn test_person_hits_have_no_summary() {
        let hit = SearchHit {
            id: 1,
            kind: HitKind::Person,
            title: "Timothée Chalamet".to_string(),
            release_year: None,
            poster_path: Some("/x.jpg".to_string()),
            backdrop_path: None,
            rating: None,
            overview: None,
        };
        assert!(hit.media_type().is_none());
        assert!(hit.into_summary().is_none());
    }

    #[test]
    fn test_season_label_fallback() {
        let season = Season {
            season_number: 0,
            name: " ".to_string(),
            episode_count: 3,
            air_date: None,
            poster_path: None,
        };
        assert_eq!(season.label(), "Season 0");
    }
}
