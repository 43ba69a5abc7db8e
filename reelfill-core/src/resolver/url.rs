use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static REVIEW_LINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:www\.)?(?:boxd\.it|letterboxd\.com)/[^\s)\]>]+")
        .expect("review link regex should compile")
});

const SCHEMELESS_HOSTS: [&str; 3] =
    ["boxd.it/", "letterboxd.com/", "www.letterboxd.com/"];

/// Trims the link, adds `https://` to scheme-less review-site links and
/// upgrades plain `http://`.
pub fn normalize_review_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();

    if lower.starts_with("http://") {
        return format!("https://{}", &trimmed["http://".len()..]);
    }
    if SCHEMELESS_HOSTS.iter().any(|host| lower.starts_with(host)) {
        return format!("https://{trimmed}");
    }
    trimmed.to_string()
}

fn is_letterboxd_host(url: &Url) -> bool {
    matches!(
        url.host_str(),
        Some("letterboxd.com") | Some("www.letterboxd.com")
    )
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// Film slug of a Letterboxd film or review URL
/// (`/film/<slug>/` or `/<member>/film/<slug>/...`).
pub fn film_slug(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !is_letterboxd_host(&parsed) {
        return None;
    }
    let segments = path_segments(&parsed);
    let film_at = segments.iter().position(|segment| *segment == "film")?;
    segments.get(film_at + 1).map(|slug| slug.to_string())
}

/// `https://letterboxd.com/film/<slug>/` for any Letterboxd URL that names a
/// film.
pub fn canonical_film_url(url: &str) -> Option<String> {
    film_slug(url).map(|slug| format!("https://letterboxd.com/film/{slug}/"))
}

/// Human-cased title rebuilt from the film slug. Short links and member
/// pages name no film, so they yield nothing.
pub fn slug_title(url: &str) -> Option<String> {
    let slug = film_slug(url)?;

    let words: Vec<String> = slug
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// First Letterboxd or `boxd.it` link in free text.
pub fn find_review_url(text: &str) -> Option<String> {
    REVIEW_LINK_REGEX.find(text).map(|found| {
        found
            .as_str()
            .trim_end_matches(['.', ',', ';', '"', '\''])
            .to_string()
    })
}
