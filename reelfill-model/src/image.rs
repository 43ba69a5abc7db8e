//! TMDb image size segments used when building poster and backdrop URLs.

use std::fmt;

/// Poster widths served by the TMDb image CDN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum PosterSize {
    /// 92px width - tiny thumbnail
    W92,
    W154,
    W185,
    W342,
    /// 500px width - the size most database galleries render well
    #[default]
    W500,
    W780,
    Original,
}

impl PosterSize {
    pub fn as_tmdb_param(self) -> &'static str {
        match self {
            PosterSize::W92 => "w92",
            PosterSize::W154 => "w154",
            PosterSize::W185 => "w185",
            PosterSize::W342 => "w342",
            PosterSize::W500 => "w500",
            PosterSize::W780 => "w780",
            PosterSize::Original => "original",
        }
    }
}

impl fmt::Display for PosterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tmdb_param())
    }
}

/// Backdrop widths served by the TMDb image CDN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum BackdropSize {
    W300,
    W780,
    #[default]
    W1280,
    Original,
}

impl BackdropSize {
    pub fn as_tmdb_param(self) -> &'static str {
        match self {
            BackdropSize::W300 => "w300",
            BackdropSize::W780 => "w780",
            BackdropSize::W1280 => "w1280",
            BackdropSize::Original => "original",
        }
    }
}

impl fmt::Display for BackdropSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tmdb_param())
    }
}
