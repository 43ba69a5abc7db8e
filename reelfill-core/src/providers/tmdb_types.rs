use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

/// Movie entry shared by `/search/movie` and `/find` responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieSummary {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

impl MovieSummary {
    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|date| date.year())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub results: Vec<MovieSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindResponse {
    #[serde(default)]
    pub movie_results: Vec<MovieSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpokenLanguage {
    #[serde(default)]
    pub english_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// `/movie/{id}` detail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieDetails {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub production_countries: Vec<NamedEntry>,
    #[serde(default)]
    pub spoken_languages: Vec<SpokenLanguage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrewMember {
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

/// `/movie/{id}/credits`. Cast arrives in billing order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub key: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// `/movie/{id}/videos`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Videos {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchMovieQuery<'a> {
    pub query: &'a str,
    pub include_adult: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FindQuery<'a> {
    pub external_source: &'a str,
}
