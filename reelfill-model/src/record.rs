use std::fmt;

/// Normalized movie metadata.
///
/// Providers each fill the subset they expose; the merged record produced
/// from several providers has the same shape. Every field is independently
/// optional and empty-like values (blank strings, empty lists) are treated
/// exactly like missing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovieRecord {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime_minutes: Option<u32>,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub cinematographer: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub trailer_url: Option<String>,
    pub original_title: Option<String>,
    pub synopsis: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub countries: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub languages: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cast_top: Vec<String>,
}

/// A single typed value for one [`MetadataField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Number(i64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Items of the value as a list; text is split on commas the way
    /// providers join multiple names.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            FieldValue::Number(n) => vec![n.to_string()],
            FieldValue::Text(text) => split_names(text),
            FieldValue::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Value rendered as a single line of text.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(text) => text.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Splits a provider's comma-joined name list into trimmed, non-empty parts.
pub fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Year from the first four characters of a date-like string, such as
/// `"2023"`, `"2023-06-02"` or `"2019–2021"`.
pub fn leading_year(raw: &str) -> Option<i32> {
    let digits = raw.trim().get(..4)?;
    if digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

/// The writable metadata fields of a movie row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataField {
    Year,
    Runtime,
    Director,
    Writer,
    Cinematographer,
    Poster,
    Backdrop,
    TrailerUrl,
    OriginalTitle,
    Synopsis,
    Countries,
    Languages,
    CastTop,
}

impl MetadataField {
    pub const ALL: [MetadataField; 13] = [
        MetadataField::Year,
        MetadataField::Runtime,
        MetadataField::Director,
        MetadataField::Writer,
        MetadataField::Cinematographer,
        MetadataField::Poster,
        MetadataField::Backdrop,
        MetadataField::TrailerUrl,
        MetadataField::OriginalTitle,
        MetadataField::Synopsis,
        MetadataField::Countries,
        MetadataField::Languages,
        MetadataField::CastTop,
    ];

    /// Fields whose absence makes the sync consult the next provider.
    pub const CORE: [MetadataField; 7] = [
        MetadataField::Year,
        MetadataField::Director,
        MetadataField::Writer,
        MetadataField::Cinematographer,
        MetadataField::Runtime,
        MetadataField::Poster,
        MetadataField::Backdrop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetadataField::Year => "year",
            MetadataField::Runtime => "runtime",
            MetadataField::Director => "director",
            MetadataField::Writer => "writer",
            MetadataField::Cinematographer => "cinematography",
            MetadataField::Poster => "poster",
            MetadataField::Backdrop => "backdrop",
            MetadataField::TrailerUrl => "trailer_url",
            MetadataField::OriginalTitle => "original_title",
            MetadataField::Synopsis => "synopsis",
            MetadataField::Countries => "countries",
            MetadataField::Languages => "languages",
            MetadataField::CastTop => "cast_top",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, MetadataField::Year | MetadataField::Runtime)
    }

    pub fn is_url(self) -> bool {
        matches!(
            self,
            MetadataField::Poster
                | MetadataField::Backdrop
                | MetadataField::TrailerUrl
        )
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn present_text(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn present_list(items: &[String]) -> Option<Vec<String>> {
    let kept: Vec<String> = items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    (!kept.is_empty()).then_some(kept)
}

fn fill_text(slot: &mut Option<String>, source: &Option<String>) {
    if present_text(slot).is_none()
        && let Some(value) = present_text(source)
    {
        *slot = Some(value.to_string());
    }
}

fn fill_number<T: Copy>(slot: &mut Option<T>, source: Option<T>) {
    if slot.is_none() {
        *slot = source;
    }
}

fn fill_list(slot: &mut Vec<String>, source: &[String]) {
    if present_list(slot).is_none()
        && let Some(values) = present_list(source)
    {
        *slot = values;
    }
}

impl MovieRecord {
    /// Copies every field that is empty here and non-empty in `other`.
    ///
    /// Fields already set are never touched, so folding records in
    /// precedence order keeps the highest-precedence value.
    pub fn fill_missing_from(&mut self, other: &MovieRecord) {
        fill_text(&mut self.title, &other.title);
        fill_number(&mut self.year, other.year);
        fill_number(&mut self.runtime_minutes, other.runtime_minutes);
        fill_text(&mut self.director, &other.director);
        fill_text(&mut self.writer, &other.writer);
        fill_text(&mut self.cinematographer, &other.cinematographer);
        fill_text(&mut self.poster_url, &other.poster_url);
        fill_text(&mut self.backdrop_url, &other.backdrop_url);
        fill_text(&mut self.trailer_url, &other.trailer_url);
        fill_text(&mut self.original_title, &other.original_title);
        fill_text(&mut self.synopsis, &other.synopsis);
        fill_list(&mut self.countries, &other.countries);
        fill_list(&mut self.languages, &other.languages);
        fill_list(&mut self.cast_top, &other.cast_top);
    }

    /// Typed value of `field`, or `None` when the field is empty.
    pub fn value(&self, field: MetadataField) -> Option<FieldValue> {
        let text = |value: &Option<String>| {
            present_text(value).map(|text| FieldValue::Text(text.to_string()))
        };
        match field {
            MetadataField::Year => {
                self.year.map(|year| FieldValue::Number(i64::from(year)))
            }
            MetadataField::Runtime => self
                .runtime_minutes
                .map(|minutes| FieldValue::Number(i64::from(minutes))),
            MetadataField::Director => text(&self.director),
            MetadataField::Writer => text(&self.writer),
            MetadataField::Cinematographer => text(&self.cinematographer),
            MetadataField::Poster => text(&self.poster_url),
            MetadataField::Backdrop => text(&self.backdrop_url),
            MetadataField::TrailerUrl => text(&self.trailer_url),
            MetadataField::OriginalTitle => text(&self.original_title),
            MetadataField::Synopsis => text(&self.synopsis),
            MetadataField::Countries => {
                present_list(&self.countries).map(FieldValue::List)
            }
            MetadataField::Languages => {
                present_list(&self.languages).map(FieldValue::List)
            }
            MetadataField::CastTop => {
                present_list(&self.cast_top).map(FieldValue::List)
            }
        }
    }

    /// Stores `value` into `field`, converting between the shapes a database
    /// column may hold. Values that cannot be represented are ignored.
    pub fn set(&mut self, field: MetadataField, value: FieldValue) {
        let text = |value: FieldValue| {
            let text = value.as_text();
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        let number = |value: &FieldValue| match value {
            FieldValue::Number(n) => Some(*n),
            other => other.as_text().trim().parse::<i64>().ok(),
        };
        match field {
            MetadataField::Year => {
                self.year = number(&value).and_then(|n| i32::try_from(n).ok())
            }
            MetadataField::Runtime => {
                self.runtime_minutes =
                    number(&value).and_then(|n| u32::try_from(n).ok())
            }
            MetadataField::Director => self.director = text(value),
            MetadataField::Writer => self.writer = text(value),
            MetadataField::Cinematographer => {
                self.cinematographer = text(value)
            }
            MetadataField::Poster => self.poster_url = text(value),
            MetadataField::Backdrop => self.backdrop_url = text(value),
            MetadataField::TrailerUrl => self.trailer_url = text(value),
            MetadataField::OriginalTitle => self.original_title = text(value),
            MetadataField::Synopsis => self.synopsis = text(value),
            MetadataField::Countries => self.countries = value.as_list(),
            MetadataField::Languages => self.languages = value.as_list(),
            MetadataField::CastTop => self.cast_top = value.as_list(),
        }
    }

    pub fn has(&self, field: MetadataField) -> bool {
        self.value(field).is_some()
    }

    /// Core fields that are still empty.
    pub fn missing_core(&self) -> Vec<MetadataField> {
        MetadataField::CORE
            .into_iter()
            .filter(|field| !self.has(*field))
            .collect()
    }

    /// True when no field, title included, carries a value.
    pub fn is_empty(&self) -> bool {
        present_text(&self.title).is_none()
            && MetadataField::ALL.iter().all(|field| !self.has(*field))
    }

    /// Whether another, lower-precedence source should still be consulted.
    pub fn needs_fallback(&self) -> bool {
        self.is_empty() || !self.missing_core().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_year_reads_date_prefixes() {
        assert_eq!(leading_year("2023"), Some(2023));
        assert_eq!(leading_year(" 2023-06-02"), Some(2023));
        assert_eq!(leading_year("2019–2021"), Some(2019));
        assert_eq!(leading_year("N/A"), None);
        assert_eq!(leading_year("23"), None);
    }

    #[test]
    fn blank_values_do_not_count_as_set() {
        let record = MovieRecord {
            director: Some("   ".into()),
            countries: vec![" ".into()],
            ..MovieRecord::default()
        };

        assert!(record.is_empty());
        assert_eq!(record.value(MetadataField::Director), None);
        assert_eq!(record.value(MetadataField::Countries), None);
    }

    #[test]
    fn fill_keeps_existing_values_and_replaces_blank_ones() {
        let mut record = MovieRecord {
            director: Some("Celine Song".into()),
            writer: Some(String::new()),
            ..MovieRecord::default()
        };
        let other = MovieRecord {
            director: Some("Someone Else".into()),
            writer: Some("Celine Song".into()),
            runtime_minutes: Some(105),
            ..MovieRecord::default()
        };

        record.fill_missing_from(&other);

        assert_eq!(record.director.as_deref(), Some("Celine Song"));
        assert_eq!(record.writer.as_deref(), Some("Celine Song"));
        assert_eq!(record.runtime_minutes, Some(105));
    }

    #[test]
    fn missing_core_tracks_required_fields() {
        let record = MovieRecord {
            year: Some(2023),
            director: Some("A".into()),
            writer: Some("W".into()),
            runtime_minutes: Some(100),
            poster_url: Some("https://img/p.jpg".into()),
            ..MovieRecord::default()
        };

        assert_eq!(
            record.missing_core(),
            vec![MetadataField::Cinematographer, MetadataField::Backdrop]
        );
        assert!(record.needs_fallback());
    }

    #[test]
    fn set_converts_between_column_shapes() {
        let mut record = MovieRecord::default();

        record.set(MetadataField::Year, FieldValue::Text(" 2023 ".into()));
        record.set(MetadataField::Runtime, FieldValue::Number(-5));
        record.set(
            MetadataField::Countries,
            FieldValue::Text("South Korea, United States".into()),
        );
        record.set(
            MetadataField::Director,
            FieldValue::List(vec!["Celine Song".into()]),
        );

        assert_eq!(record.year, Some(2023));
        assert_eq!(record.runtime_minutes, None);
        assert_eq!(record.countries, vec!["South Korea", "United States"]);
        assert_eq!(record.director.as_deref(), Some("Celine Song"));
    }

    #[test]
    fn text_values_split_into_name_lists() {
        let value = FieldValue::Text("Bong Joon-ho,  Han Jin-won ,".into());
        assert_eq!(value.as_list(), vec!["Bong Joon-ho", "Han Jin-won"]);
    }
}
