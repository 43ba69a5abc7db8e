use async_trait::async_trait;
use reelfill_model::MovieIdentity;
use reqwest::{Client, Response, header};
use tracing::{debug, warn};
use url::Url;

use crate::http::{BROWSER_USER_AGENT, HttpClients};

use super::{
    IdentityResolver,
    page::{PageIdentity, identity_from_page},
    url::{canonical_film_url, normalize_review_url, slug_title},
};

#[derive(Debug)]
struct FetchedPage {
    final_url: String,
    body: String,
}

#[derive(Debug)]
struct Attempt {
    final_url: String,
    page: PageIdentity,
}

/// Resolves Letterboxd film, review and `boxd.it` short links.
#[derive(Debug, Clone)]
pub struct LetterboxdResolver {
    http: Client,
    no_redirect: Client,
}

impl LetterboxdResolver {
    pub fn new(clients: &HttpClients) -> Self {
        Self {
            http: clients.standard.clone(),
            no_redirect: clients.no_redirect.clone(),
        }
    }

    fn get(&self, client: &Client, url: &str) -> reqwest::RequestBuilder {
        client
            .get(url)
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.8")
    }

    /// First hop without redirects so a short link's `Location` is read
    /// directly; everything after that follows redirects.
    async fn fetch_page(
        &self,
        url: &str,
    ) -> Result<FetchedPage, reqwest::Error> {
        let first = self.get(&self.no_redirect, url).send().await?;
        let response = match redirect_target(&first, url) {
            Some(target) => {
                debug!(from = url, to = %target, "following review redirect");
                self.get(&self.http, target.as_str()).send().await?
            }
            None => self.get(&self.http, url).send().await?,
        };

        let response = response.error_for_status()?;
        let final_url = response.url().to_string();
        let body = response.text().await?;
        Ok(FetchedPage { final_url, body })
    }

    async fn attempt(&self, url: &str) -> Option<Attempt> {
        match self.fetch_page(url).await {
            Ok(fetched) => {
                let page =
                    identity_from_page(&fetched.final_url, &fetched.body);
                debug!(
                    url,
                    final_url = %fetched.final_url,
                    structured = page.structured,
                    title = ?page.identity.title,
                    year = ?page.identity.year,
                    "resolved review page"
                );
                Some(Attempt {
                    final_url: fetched.final_url,
                    page,
                })
            }
            Err(err) => {
                warn!(url, error = %err, "failed to fetch review page");
                None
            }
        }
    }
}

fn redirect_target(response: &Response, requested: &str) -> Option<Url> {
    if !response.status().is_redirection() {
        return None;
    }
    let location = response.headers().get(header::LOCATION)?.to_str().ok()?;
    Url::parse(requested).ok()?.join(location).ok()
}

fn fill_identity(target: &mut MovieIdentity, fallback: MovieIdentity) {
    target.title = target.title.take().or(fallback.title);
    target.year = target.year.or(fallback.year);
    target.imdb_id = target.imdb_id.take().or(fallback.imdb_id);
    target.tmdb_id = target.tmdb_id.take().or(fallback.tmdb_id);
}

/// What an unreachable link still says about the film: only a film slug
/// counts, so the row's own title is used for short links.
fn unfetched_identity(url: &str) -> MovieIdentity {
    MovieIdentity {
        title: slug_title(url),
        ..MovieIdentity::default()
    }
}

#[async_trait]
impl IdentityResolver for LetterboxdResolver {
    async fn resolve(&self, url: &str) -> MovieIdentity {
        let normalized = normalize_review_url(url);
        if normalized.is_empty() {
            return MovieIdentity::default();
        }

        let first = self.attempt(&normalized).await;
        let landed = first
            .as_ref()
            .map_or(normalized.as_str(), |attempt| attempt.final_url.as_str());
        let needs_retry =
            first.as_ref().is_none_or(|attempt| !attempt.page.structured);

        if needs_retry
            && let Some(canonical) = canonical_film_url(landed)
            && canonical != landed
            && canonical != normalized
        {
            debug!(url = %normalized, %canonical, "retrying with film page");
            if let Some(second) = self.attempt(&canonical).await {
                let mut identity = second.page.identity;
                if let Some(first) = first {
                    fill_identity(&mut identity, first.page.identity);
                }
                return identity;
            }
        }

        match first {
            Some(attempt) => attempt.page.identity,
            None => unfetched_identity(&normalized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_keeps_first_attempt_fields_as_fallback() {
        let mut identity = MovieIdentity {
            title: Some("Past Lives".into()),
            ..MovieIdentity::default()
        };
        let first = MovieIdentity {
            title: Some("My review".into()),
            year: Some(2023),
            ..MovieIdentity::default()
        };

        fill_identity(&mut identity, first);

        assert_eq!(identity.title.as_deref(), Some("Past Lives"));
        assert_eq!(identity.year, Some(2023));
    }

    #[test]
    fn unreachable_short_link_leaves_the_title_empty() {
        assert!(unfetched_identity("https://boxd.it/5E3o").is_empty());
        assert_eq!(
            unfetched_identity("https://letterboxd.com/film/aftersun/")
                .title
                .as_deref(),
            Some("Aftersun")
        );
    }
}
