//! Identity extraction from a fetched review page.
//!
//! Structured data is preferred; the meta tags and the page text are only
//! consulted for the fields it leaves empty.

use once_cell::sync::Lazy;
use regex::Regex;
use reelfill_model::{MovieIdentity, leading_year};
use scraper::{Html, Selector};
use serde_json::{Map, Value};

use super::url::slug_title;

static LD_JSON_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#)
        .expect("ld+json selector should parse")
});

static OG_TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="og:title"]"#)
        .expect("og:title selector should parse")
});

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("title").expect("title selector should parse")
});

static H1_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("h1 selector should parse"));

static YEAR_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\((?:19|20)\d{2}\)(?:\s+directed\s+by\b.*)?$")
        .expect("year suffix regex should compile")
});

static YEAR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:19|20)\d{2})\b").expect("year regex should compile")
});

static IMDB_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"imdb\.com/title/(tt\d+)").expect("imdb regex should compile")
});

static TMDB_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"themoviedb\.org/movie/(\d+)")
        .expect("tmdb regex should compile")
});

static TMDB_ATTR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"data-tmdb-id="(\d+)""#)
        .expect("tmdb attribute regex should compile")
});

const TITLE_SEPARATORS: [&str; 3] = [" • ", " | ", " — "];
const LEFT_TO_RIGHT_MARK: char = '\u{200e}';

/// What one page yielded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageIdentity {
    pub identity: MovieIdentity,
    /// Whether the page carried a structured `Movie` object.
    pub structured: bool,
}

/// Extracts a best-effort identity from `html`, served at `page_url`.
pub fn identity_from_page(page_url: &str, html: &str) -> PageIdentity {
    let document = Html::parse_document(html);
    let movie = structured_movie(&document);
    let og_title = meta_content(&document, &OG_TITLE_SELECTOR);

    let title = movie
        .as_ref()
        .and_then(|movie| non_empty_str(movie.get("name")))
        .or_else(|| og_title.as_deref().and_then(clean_page_title))
        .or_else(|| {
            first_text(&document, &TITLE_SELECTOR)
                .as_deref()
                .and_then(clean_page_title)
        })
        .or_else(|| slug_title(page_url));

    let year = movie
        .as_ref()
        .and_then(structured_year)
        .or_else(|| og_title.as_deref().and_then(year_in))
        .or_else(|| {
            first_text(&document, &H1_SELECTOR)
                .as_deref()
                .and_then(year_in)
        });

    let mut identity = MovieIdentity {
        title,
        year,
        imdb_id: None,
        tmdb_id: None,
    };

    if let Some(movie) = &movie {
        let mut strings = Vec::new();
        movie
            .values()
            .for_each(|value| collect_strings(value, &mut strings));
        for text in strings {
            if identity.imdb_id.is_none() {
                identity.imdb_id = capture(&IMDB_REGEX, text);
            }
            if identity.tmdb_id.is_none() {
                identity.tmdb_id = capture(&TMDB_REGEX, text);
            }
        }
    }
    if identity.imdb_id.is_none() {
        identity.imdb_id = capture(&IMDB_REGEX, html);
    }
    if identity.tmdb_id.is_none() {
        identity.tmdb_id = capture(&TMDB_REGEX, html)
            .or_else(|| capture(&TMDB_ATTR_REGEX, html));
    }

    PageIdentity {
        identity,
        structured: movie.is_some(),
    }
}

fn structured_movie(document: &Html) -> Option<Map<String, Value>> {
    document.select(&LD_JSON_SELECTOR).find_map(|script| {
        let raw: String = script.text().collect();
        let payload: Value = serde_json::from_str(strip_cdata(&raw)).ok()?;
        find_movie(&payload)
    })
}

/// Letterboxd wraps its JSON-LD in commented CDATA markers.
fn strip_cdata(raw: &str) -> &str {
    let mut text = raw.trim();
    for prefix in ["/* <![CDATA[ */", "<![CDATA["] {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest.trim();
        }
    }
    for suffix in ["/* ]]> */", "]]>"] {
        if let Some(rest) = text.strip_suffix(suffix) {
            text = rest.trim();
        }
    }
    text
}

fn find_movie(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) if is_movie(map) => Some(map.clone()),
        Value::Object(map) => map.get("@graph").and_then(find_movie),
        Value::Array(items) => items.iter().find_map(find_movie),
        _ => None,
    }
}

fn is_movie(map: &Map<String, Value>) -> bool {
    match map.get("@type") {
        Some(Value::String(kind)) => kind == "Movie",
        Some(Value::Array(kinds)) => {
            kinds.iter().any(|kind| kind.as_str() == Some("Movie"))
        }
        _ => false,
    }
}

fn structured_year(movie: &Map<String, Value>) -> Option<i32> {
    if let Some(year) = movie
        .get("datePublished")
        .and_then(Value::as_str)
        .and_then(leading_year)
    {
        return Some(year);
    }

    match movie.get("releasedEvent")? {
        Value::Array(events) => events.iter().find_map(event_year),
        event => event_year(event),
    }
}

fn event_year(event: &Value) -> Option<i32> {
    event.get("startDate").and_then(Value::as_str).and_then(leading_year)
}

fn year_in(text: &str) -> Option<i32> {
    YEAR_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|year| year.as_str().parse().ok())
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(text) => out.push(text),
        Value::Array(items) => {
            items.iter().for_each(|item| collect_strings(item, out))
        }
        Value::Object(map) => {
            map.values().for_each(|item| collect_strings(item, out))
        }
        _ => {}
    }
}

fn capture(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|found| found.as_str().to_string())
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(|text| text.trim_matches(LEFT_TO_RIGHT_MARK).trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .find_map(|element| element.value().attr("content"))
        .map(str::to_string)
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>())
}

/// Strips the site-name suffix, the `(YYYY)` / `directed by` tail and the
/// left-to-right mark from a meta or `<title>` string.
pub fn clean_page_title(raw: &str) -> Option<String> {
    let text = raw.replace(LEFT_TO_RIGHT_MARK, "");
    let text = text.trim();
    let head = TITLE_SEPARATORS
        .iter()
        .filter_map(|separator| text.find(separator))
        .min()
        .map_or(text, |end| &text[..end]);
    let cleaned = YEAR_SUFFIX_REGEX.replace(head.trim(), "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAST_LIVES: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>&lrm;Past Lives (2023) directed by Celine Song • Reviews, film + cast • Letterboxd</title>
<meta property="og:title" content="Past Lives (2023)" />
<script type="application/ld+json">
/* <![CDATA[ */
{"@context":"http://schema.org","@type":"Movie","name":"Past Lives",
 "releasedEvent":[{"@type":"PublicationEvent","startDate":"2023"}],
 "url":"https://letterboxd.com/film/past-lives/"}
/* ]]> */
</script>
</head>
<body class="film backdropped" data-tmdb-id="666277">
<h1 class="headline-1">Past Lives</h1>
<a href="http://www.imdb.com/title/tt13238346/maindetails" data-track-action="IMDb">IMDb</a>
<a href="https://www.themoviedb.org/movie/666277/" data-track-action="TMDb">TMDb</a>
</body>
</html>"#;

    #[test]
    fn reads_structured_movie_and_page_links() {
        let page = identity_from_page(
            "https://letterboxd.com/film/past-lives/",
            PAST_LIVES,
        );

        assert!(page.structured);
        assert_eq!(
            page.identity,
            MovieIdentity {
                title: Some("Past Lives".into()),
                year: Some(2023),
                imdb_id: Some("tt13238346".into()),
                tmdb_id: Some("666277".into()),
            }
        );
    }

    #[test]
    fn falls_back_to_meta_title_without_movie_object() {
        let html = r#"<html><head>
<meta property="og:title" content="&lrm;Aftersun (2022) directed by Charlotte Wells | Letterboxd" />
<script type="application/ld+json">{"@type":"Review","name":"ignored"}</script>
<script type="application/ld+json">{}</script>
</head><body><h1>A review</h1></body></html>"#;

        let page =
            identity_from_page("https://letterboxd.com/me/film/aftersun/", html);

        assert!(!page.structured);
        assert_eq!(page.identity.title.as_deref(), Some("Aftersun"));
        assert_eq!(page.identity.year, Some(2022));
        assert_eq!(page.identity.imdb_id, None);
    }

    #[test]
    fn finds_movie_in_graph_wrappers_and_lists() {
        let graph = r#"<script type="application/ld+json">
{"@graph":[{"@type":"WebPage"},{"@type":["CreativeWork","Movie"],
 "name":"Decision to Leave","datePublished":"2022-06-29",
 "sameAs":["https://www.imdb.com/title/tt12477480/"]}]}</script>"#;
        let list = r#"<script type="application/ld+json">
[{"@type":"Person"},{"@type":"Movie","name":"Burning"}]</script>"#;

        let from_graph =
            identity_from_page("https://letterboxd.com/film/x/", graph);
        let from_list =
            identity_from_page("https://letterboxd.com/film/x/", list);

        assert_eq!(
            from_graph.identity.title.as_deref(),
            Some("Decision to Leave")
        );
        assert_eq!(from_graph.identity.year, Some(2022));
        assert_eq!(from_graph.identity.imdb_id.as_deref(), Some("tt12477480"));
        assert_eq!(from_list.identity.title.as_deref(), Some("Burning"));
    }

    #[test]
    fn empty_page_falls_back_to_the_url_slug() {
        let page = identity_from_page(
            "https://letterboxd.com/film/in-the-mood-for-love/",
            "<html><body></body></html>",
        );

        assert_eq!(
            page.identity.title.as_deref(),
            Some("In The Mood For Love")
        );
        assert_eq!(page.identity.year, None);
    }

    #[test]
    fn page_titles_lose_site_name_and_year() {
        assert_eq!(
            clean_page_title("\u{200e}Past Lives (2023) • Letterboxd")
                .as_deref(),
            Some("Past Lives")
        );
        assert_eq!(
            clean_page_title("Heat (1995) — Letterboxd").as_deref(),
            Some("Heat")
        );
        assert_eq!(clean_page_title(" • Letterboxd"), None);
    }
}
