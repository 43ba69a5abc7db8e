pub mod omdb;
pub mod tmdb;
pub mod tmdb_types;

use async_trait::async_trait;
use reelfill_model::MovieRecord;
use reqwest::RequestBuilder;
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

pub use omdb::OmdbProvider;
pub use tmdb::TmdbProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Not found")]
    NotFound,

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// A source of movie metadata.
///
/// Lookups return `None` on any failure; the implementation logs why.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Looks up a movie by an identifier the provider understands.
    async fn lookup_by_id(&self, id: &str) -> Option<MovieRecord>;

    /// Looks up a movie by title, preferring a match on `year`.
    async fn lookup_by_title(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Option<MovieRecord>;
}

/// Logs a failed lookup and collapses the result to an `Option`.
pub(crate) fn collapse(
    provider: &'static str,
    lookup: &str,
    result: Result<MovieRecord, ProviderError>,
) -> Option<MovieRecord> {
    match result {
        Ok(record) => Some(record),
        Err(ProviderError::NotFound) => {
            debug!(provider, lookup, "no match");
            None
        }
        Err(ProviderError::MissingApiKey) => {
            debug!(provider, lookup, "skipped, no API key configured");
            None
        }
        Err(err) => {
            warn!(provider, lookup, error = %err, "lookup failed");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default, rename = "Error")]
    error: Option<String>,
}

/// Sends `request` and decodes a JSON body, mapping the status codes both
/// providers share onto [`ProviderError`].
pub(crate) async fn get_json<T>(
    request: RequestBuilder,
) -> Result<T, ProviderError>
where
    T: DeserializeOwned,
{
    let response = request.send().await?;

    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        return serde_json::from_slice::<T>(&bytes)
            .map_err(|err| ProviderError::ParseError(err.to_string()));
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.status_message.or(body.error))
        .unwrap_or_else(|| format!("request failed with status {status}"));

    match status.as_u16() {
        401 => Err(ProviderError::InvalidApiKey),
        404 => Err(ProviderError::NotFound),
        429 => Err(ProviderError::RateLimited),
        _ => Err(ProviderError::ApiError(message)),
    }
}

/// Trimmed text, with blanks and the `N/A` placeholder treated as absent.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty() && text != "N/A")
}
