use async_trait::async_trait;
use reelfill_config::ApiCredential;
use reelfill_model::{MovieRecord, leading_year, split_names};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::http::authorize;

use super::{MetadataProvider, ProviderError, collapse, get_json, present};

const OMDB_BASE_URL: &str = "https://www.omdbapi.com/";
const CAST_TOP_LIMIT: usize = 3;

/// A single title as returned by `?i=` and `?t=` lookups.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OmdbTitle {
    pub response: Option<String>,
    pub error: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub runtime: Option<String>,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub actors: Option<String>,
    pub plot: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub poster: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OmdbSearch {
    pub response: Option<String>,
    pub search: Vec<OmdbSearchItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OmdbSearchItem {
    pub title: Option<String>,
    pub year: Option<String>,
    pub poster: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
}

fn succeeded(response: &Option<String>) -> bool {
    response.as_deref() == Some("True")
}

/// `"105 min"` to `105`. Anything else is treated as unknown.
pub fn parse_runtime(raw: &str) -> Option<u32> {
    raw.trim()
        .strip_suffix(" min")
        .filter(|minutes| {
            !minutes.is_empty() && minutes.bytes().all(|b| b.is_ascii_digit())
        })?
        .parse()
        .ok()
}

fn http_url(value: Option<String>) -> Option<String> {
    present(value).filter(|url| {
        url.starts_with("http://") || url.starts_with("https://")
    })
}

fn names(value: Option<String>) -> Vec<String> {
    present(value).map(|raw| split_names(&raw)).unwrap_or_default()
}

pub fn record_from_title(title: OmdbTitle) -> MovieRecord {
    let name = present(title.title);
    MovieRecord {
        original_title: name.clone(),
        title: name,
        year: present(title.year).as_deref().and_then(leading_year),
        runtime_minutes: title.runtime.as_deref().and_then(parse_runtime),
        director: present(title.director),
        writer: present(title.writer),
        cinematographer: None,
        poster_url: http_url(title.poster),
        backdrop_url: None,
        trailer_url: None,
        synopsis: present(title.plot),
        countries: names(title.country),
        languages: names(title.language),
        cast_top: names(title.actors)
            .into_iter()
            .take(CAST_TOP_LIMIT)
            .collect(),
    }
}

fn record_from_search(item: &OmdbSearchItem) -> MovieRecord {
    let name = present(item.title.clone());
    MovieRecord {
        original_title: name.clone(),
        title: name,
        year: item.year.as_deref().and_then(leading_year),
        poster_url: http_url(item.poster.clone()),
        ..MovieRecord::default()
    }
}

/// The search result released in `year`, else the first one.
pub fn pick_search_result(
    items: &[OmdbSearchItem],
    year: Option<i32>,
) -> Option<&OmdbSearchItem> {
    year.and_then(|wanted| {
        items.iter().find(|item| {
            item.year.as_deref().and_then(leading_year) == Some(wanted)
        })
    })
    .or_else(|| items.first())
}

/// OMDb client, the primary provider.
#[derive(Debug, Clone)]
pub struct OmdbProvider {
    http: Client,
    api_key: Option<ApiCredential>,
}

impl OmdbProvider {
    pub fn new(http: Client, api_key: Option<ApiCredential>) -> Self {
        Self { http, api_key }
    }

    fn request(
        &self,
        params: &[(&str, &str)],
    ) -> Result<RequestBuilder, ProviderError> {
        let key = self.api_key.as_ref().ok_or(ProviderError::MissingApiKey)?;
        Ok(authorize(
            self.http.get(OMDB_BASE_URL).query(params),
            key,
            "apikey",
        ))
    }

    async fn fetch_title(
        &self,
        params: &[(&str, &str)],
    ) -> Result<OmdbTitle, ProviderError> {
        let title: OmdbTitle = get_json(self.request(params)?).await?;
        if succeeded(&title.response) {
            Ok(title)
        } else {
            debug!(error = ?title.error, "omdb reported no result");
            Err(ProviderError::NotFound)
        }
    }

    async fn by_id(
        &self,
        imdb_id: &str,
    ) -> Result<MovieRecord, ProviderError> {
        let imdb_id = imdb_id.trim();
        if !imdb_id.starts_with("tt") {
            return Err(ProviderError::NotFound);
        }
        let title = self
            .fetch_title(&[("i", imdb_id), ("plot", "full")])
            .await?;
        Ok(record_from_title(title))
    }

    async fn by_title(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<MovieRecord, ProviderError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ProviderError::NotFound);
        }

        let year_param = year.map(|year| year.to_string());
        let mut params =
            vec![("t", title), ("type", "movie"), ("plot", "full")];
        if let Some(year) = year_param.as_deref() {
            params.push(("y", year));
        }
        match self.fetch_title(&params).await {
            Ok(found) => return Ok(record_from_title(found)),
            Err(ProviderError::NotFound) => {}
            Err(err) => return Err(err),
        }

        debug!(title, ?year, "exact title missed, searching");
        let request = self.request(&[("s", title), ("type", "movie")])?;
        let search: OmdbSearch = get_json(request).await?;
        if !succeeded(&search.response) {
            return Err(ProviderError::NotFound);
        }
        let candidate = pick_search_result(&search.search, year)
            .ok_or(ProviderError::NotFound)?;

        match present(candidate.imdb_id.clone()) {
            Some(imdb_id) => match self.by_id(&imdb_id).await {
                Ok(record) => Ok(record),
                Err(err) => {
                    debug!(%imdb_id, error = %err, "using thin search result");
                    Ok(record_from_search(candidate))
                }
            },
            None => Ok(record_from_search(candidate)),
        }
    }
}

#[async_trait]
impl MetadataProvider for OmdbProvider {
    fn name(&self) -> &'static str {
        "omdb"
    }

    async fn lookup_by_id(&self, id: &str) -> Option<MovieRecord> {
        collapse(self.name(), "by_id", self.by_id(id).await)
    }

    async fn lookup_by_title(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Option<MovieRecord> {
        collapse(self.name(), "by_title", self.by_title(title, year).await)
    }
}
