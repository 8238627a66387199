//! Image reference resolution.
//!
//! The catalog hands out bare image paths such as `/d5NXSklXo0qyIYkgV94XAgMIckC.jpg`.
//! Turning one into a fetchable URL is string composition against the image
//! host; caching is left to the HTTP layer.

use std::fmt;

/// Size token understood by the image host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// 185px wide, used for cast headshots
    W185,
    /// 300px wide
    W300,
    /// 500px wide, used for posters, cards and episode stills
    W500,
    /// 780px wide
    W780,
    /// 1280px wide
    W1280,
    /// Original upload, used for hero backdrops
    Original,
}

impl ImageSize {
    /// Token inserted into the URL path.
    pub fn token(self) -> &'static str {
        match self {
            ImageSize::W185 => "w185",
            ImageSize::W300 => "w300",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::W1280 => "w1280",
            ImageSize::Original => "original",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Builds the URL for an image path, or `None` when the item has no image.
pub fn image_url(base_url: &str, path: Option<&str>, size: ImageSize) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        Some(format!("{base}/{size}{path}"))
    } else {
        Some(format!("{base}/{size}/{path}"))
    }
}
