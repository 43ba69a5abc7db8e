use async_trait::async_trait;
use chrono::Datelike;
use reelfill_config::ApiCredential;
use reelfill_model::{BackdropSize, MovieRecord, PosterSize};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use crate::http::authorize;

use super::{
    MetadataProvider, ProviderError, collapse, get_json, present,
    tmdb_types::{
        Credits, FindQuery, FindResponse, MovieDetails, MovieSummary,
        SearchMovieQuery, SearchPage, Videos,
    },
};

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const YOUTUBE_SHORT_URL: &str = "https://youtu.be";
const CAST_TOP_LIMIT: usize = 3;

const DIRECTOR_JOBS: &[&str] = &["Director"];
const WRITER_JOBS: &[&str] = &["Writer", "Screenplay", "Author"];
const CINEMATOGRAPHY_JOBS: &[&str] =
    &["Director of Photography", "Cinematography"];

/// Image sizes used when building poster and backdrop URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSizes {
    pub poster: PosterSize,
    pub backdrop: BackdropSize,
}

/// Full image URL for a TMDb relative path; no path, no URL.
pub fn image_url(size: &str, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|path| !path.is_empty())?;
    let separator = if path.starts_with('/') { "" } else { "/" };
    Some(format!("{TMDB_IMAGE_BASE_URL}/{size}{separator}{path}"))
}

/// The result released in `year`, else the first one.
pub fn select_by_year(
    results: &[MovieSummary],
    year: Option<i32>,
) -> Option<&MovieSummary> {
    year.and_then(|wanted| {
        results
            .iter()
            .find(|movie| movie.release_year() == Some(wanted))
    })
    .or_else(|| results.first())
}

fn crew_names(credits: &Credits, jobs: &[&str]) -> Option<String> {
    let mut names: Vec<&str> = Vec::new();
    for member in &credits.crew {
        let matches =
            member.job.as_deref().is_some_and(|job| jobs.contains(&job));
        let name = member.name.trim();
        if matches && !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    (!names.is_empty()).then(|| names.join(", "))
}

fn trailer_url(videos: &Videos) -> Option<String> {
    videos
        .results
        .iter()
        .find(|video| {
            video
                .site
                .as_deref()
                .is_some_and(|site| site.eq_ignore_ascii_case("YouTube"))
                && video.kind.as_deref() == Some("Trailer")
                && !video.key.trim().is_empty()
        })
        .map(|video| format!("{YOUTUBE_SHORT_URL}/{}", video.key.trim()))
}

/// Combines whichever sub-resources were fetched into one record. Detail
/// fields win over the search or find item.
pub fn build_record(
    summary: Option<&MovieSummary>,
    details: Option<&MovieDetails>,
    credits: Option<&Credits>,
    videos: Option<&Videos>,
    sizes: ImageSizes,
) -> MovieRecord {
    let pick = |from_details: Option<&Option<String>>,
                from_summary: Option<&Option<String>>| {
        present(from_details.cloned().flatten())
            .or_else(|| present(from_summary.cloned().flatten()))
    };

    let poster_path = pick(
        details.map(|d| &d.poster_path),
        summary.map(|s| &s.poster_path),
    );
    let backdrop_path = pick(
        details.map(|d| &d.backdrop_path),
        summary.map(|s| &s.backdrop_path),
    );
    let release_year = details
        .and_then(|d| d.release_date)
        .or_else(|| summary.and_then(|s| s.release_date))
        .map(|date| date.year());

    MovieRecord {
        title: pick(details.map(|d| &d.title), summary.map(|s| &s.title)),
        year: release_year,
        runtime_minutes: details
            .and_then(|d| d.runtime)
            .filter(|minutes| *minutes > 0),
        director: credits.and_then(|c| crew_names(c, DIRECTOR_JOBS)),
        writer: credits.and_then(|c| crew_names(c, WRITER_JOBS)),
        cinematographer: credits
            .and_then(|c| crew_names(c, CINEMATOGRAPHY_JOBS)),
        poster_url: image_url(
            sizes.poster.as_tmdb_param(),
            poster_path.as_deref(),
        ),
        backdrop_url: image_url(
            sizes.backdrop.as_tmdb_param(),
            backdrop_path.as_deref(),
        ),
        trailer_url: videos.and_then(trailer_url),
        original_title: pick(
            details.map(|d| &d.original_title),
            summary.map(|s| &s.original_title),
        ),
        synopsis: pick(
            details.map(|d| &d.overview),
            summary.map(|s| &s.overview),
        ),
        countries: details
            .map(|d| {
                d.production_countries
                    .iter()
                    .filter_map(|country| present(country.name.clone()))
                    .collect()
            })
            .unwrap_or_default(),
        languages: details
            .map(|d| {
                d.spoken_languages
                    .iter()
                    .filter_map(|language| {
                        present(language.english_name.clone())
                            .or_else(|| present(language.name.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default(),
        cast_top: credits
            .map(|c| {
                c.cast
                    .iter()
                    .map(|member| member.name.trim())
                    .filter(|name| !name.is_empty())
                    .take(CAST_TOP_LIMIT)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// TMDb client, the secondary provider.
#[derive(Debug, Clone)]
pub struct TmdbProvider {
    http: Client,
    api_key: Option<ApiCredential>,
    sizes: ImageSizes,
}

impl TmdbProvider {
    pub fn new(
        http: Client,
        api_key: Option<ApiCredential>,
        sizes: ImageSizes,
    ) -> Self {
        Self {
            http,
            api_key,
            sizes,
        }
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, ProviderError> {
        let key = self.api_key.as_ref().ok_or(ProviderError::MissingApiKey)?;
        Ok(authorize(
            self.http.get(format!("{TMDB_BASE_URL}{path}")),
            key,
            "api_key",
        ))
    }

    async fn find_by_imdb(
        &self,
        imdb_id: &str,
    ) -> Result<MovieSummary, ProviderError> {
        let request = self
            .get(&format!("/find/{imdb_id}"))?
            .query(&FindQuery {
                external_source: "imdb_id",
            });
        let found: FindResponse = get_json(request).await?;
        found
            .movie_results
            .into_iter()
            .next()
            .ok_or(ProviderError::NotFound)
    }

    async fn search(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<MovieSummary, ProviderError> {
        let request = self.get("/search/movie")?.query(&SearchMovieQuery {
            query: title,
            include_adult: false,
        });
        let page: SearchPage = get_json(request).await?;
        select_by_year(&page.results, year)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    async fn details(&self, id: u64) -> Result<MovieDetails, ProviderError> {
        get_json(self.get(&format!("/movie/{id}"))?).await
    }

    async fn credits(&self, id: u64) -> Result<Credits, ProviderError> {
        get_json(self.get(&format!("/movie/{id}/credits"))?).await
    }

    async fn videos(&self, id: u64) -> Result<Videos, ProviderError> {
        get_json(self.get(&format!("/movie/{id}/videos"))?).await
    }

    /// Fetches the detail, credits and videos of `id`. Without a `summary`
    /// to fall back on, a failing detail call fails the lookup.
    async fn assemble(
        &self,
        id: u64,
        summary: Option<MovieSummary>,
    ) -> Result<MovieRecord, ProviderError> {
        let details = match self.details(id).await {
            Ok(details) => Some(details),
            Err(err) if summary.is_some() => {
                warn!(tmdb_id = id, error = %err, "movie detail unavailable");
                None
            }
            Err(err) => return Err(err),
        };
        let credits = self
            .credits(id)
            .await
            .inspect_err(|err| {
                warn!(tmdb_id = id, error = %err, "credits unavailable")
            })
            .ok();
        let videos = self
            .videos(id)
            .await
            .inspect_err(|err| {
                warn!(tmdb_id = id, error = %err, "videos unavailable")
            })
            .ok();

        let record = build_record(
            summary.as_ref(),
            details.as_ref(),
            credits.as_ref(),
            videos.as_ref(),
            self.sizes,
        );
        if record.is_empty() {
            Err(ProviderError::NotFound)
        } else {
            Ok(record)
        }
    }

    async fn by_id(&self, id: &str) -> Result<MovieRecord, ProviderError> {
        let id = id.trim();
        if id.starts_with("tt") {
            let summary = self.find_by_imdb(id).await?;
            debug!(imdb_id = id, tmdb_id = summary.id, "matched imdb id");
            return self.assemble(summary.id, Some(summary)).await;
        }
        match id.parse::<u64>() {
            Ok(tmdb_id) => self.assemble(tmdb_id, None).await,
            Err(_) => Err(ProviderError::NotFound),
        }
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
        let summary = self.search(title, year).await?;
        debug!(title, ?year, tmdb_id = summary.id, "matched title search");
        self.assemble(summary.id, Some(summary)).await
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_selects_the_requested_year() {
        let page: SearchPage = serde_json::from_str(
            r#"{"results": [
                {"id": 1, "title": "Past Lives", "release_date": "2022-01-01"},
                {"id": 2, "title": "Past Lives", "release_date": "2023-06-01"},
                {"id": 3, "title": "Past Lives", "release_date": ""}
            ]}"#,
        )
        .expect("json");

        let pick = |year| select_by_year(&page.results, year).map(|m| m.id);

        assert_eq!(pick(Some(2023)), Some(2));
        assert_eq!(pick(Some(1990)), Some(1));
        assert_eq!(pick(None), Some(1));
    }

    #[test]
    fn image_urls_need_a_path() {
        assert_eq!(
            image_url("w500", Some("/k3waqVXSnvCZWfJYNtdamTgTtTA.jpg"))
                .as_deref(),
            Some("https://image.tmdb.org/t/p/w500/k3waqVXSnvCZWfJYNtdamTgTtTA.jpg")
        );
        assert_eq!(image_url("w500", None), None);
        assert_eq!(image_url("w500", Some("  ")), None);
    }

    #[test]
    fn builds_a_record_from_sub_resources() {
        let details: MovieDetails = serde_json::from_str(
            r#"{
                "id": 666277, "title": "Past Lives",
                "original_title": "Past Lives", "runtime": 106,
                "release_date": "2023-06-02",
                "overview": "Nora and Hae Sung, two childhood friends...",
                "poster_path": "/k3waqVXSnvCZWfJYNtdamTgTtTA.jpg",
                "backdrop_path": "/xKbvmO4ws4xQW6Z0oiRpMkZHUV8.jpg",
                "production_countries": [
                    {"iso_3166_1": "US", "name": "United States of America"},
                    {"iso_3166_1": "KR", "name": "South Korea"}
                ],
                "spoken_languages": [
                    {"english_name": "English", "name": "English"},
                    {"english_name": "Korean", "name": "한국어/조선말"}
                ]
            }"#,
        )
        .expect("details");
        let credits: Credits = serde_json::from_str(
            r#"{
                "cast": [{"name": "Greta Lee"}, {"name": "Teo Yoo"},
                         {"name": "John Magaro"}, {"name": "Moon Seung-ah"}],
                "crew": [
                    {"name": "Celine Song", "job": "Director"},
                    {"name": "Celine Song", "job": "Screenplay"},
                    {"name": "Celine Song", "job": "Writer"},
                    {"name": "Shabier Kirchner", "job": "Director of Photography"},
                    {"name": "Keith Fraase", "job": "Editor"}
                ]
            }"#,
        )
        .expect("credits");
        let videos: Videos = serde_json::from_str(
            r#"{"results": [
                {"key": "teaser1", "site": "YouTube", "type": "Teaser"},
                {"key": "vimeo1", "site": "Vimeo", "type": "Trailer"},
                {"key": "kA244xewjcI", "site": "YouTube", "type": "Trailer"}
            ]}"#,
        )
        .expect("videos");

        let record = build_record(
            None,
            Some(&details),
            Some(&credits),
            Some(&videos),
            ImageSizes::default(),
        );

        assert_eq!(record.year, Some(2023));
        assert_eq!(record.runtime_minutes, Some(106));
        assert_eq!(record.director.as_deref(), Some("Celine Song"));
        assert_eq!(record.writer.as_deref(), Some("Celine Song"));
        assert_eq!(
            record.cinematographer.as_deref(),
            Some("Shabier Kirchner")
        );
        assert_eq!(
            record.cast_top,
            vec!["Greta Lee", "Teo Yoo", "John Magaro"]
        );
        assert_eq!(record.languages, vec!["English", "Korean"]);
        assert_eq!(
            record.trailer_url.as_deref(),
            Some("https://youtu.be/kA244xewjcI")
        );
        assert_eq!(
            record.backdrop_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w1280/xKbvmO4ws4xQW6Z0oiRpMkZHUV8.jpg")
        );
    }

    #[test]
    fn failed_detail_call_falls_back_to_the_search_item() {
        let summary = MovieSummary {
            id: 7,
            title: Some("Burning".into()),
            poster_path: Some("/p.jpg".into()),
            ..MovieSummary::default()
        };

        let record = build_record(
            Some(&summary),
            None,
            None,
            None,
            ImageSizes::default(),
        );

        assert_eq!(record.title.as_deref(), Some("Burning"));
        assert_eq!(
            record.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/p.jpg")
        );
        assert_eq!(record.director, None);
        assert_eq!(record.runtime_minutes, None);
    }
}
