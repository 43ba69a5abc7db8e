use reelfill_model::MetadataField;
use serde::{Deserialize, Serialize};

/// Property type of the join-key column, used to build the server-side
/// "is not empty" filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewUrlKind {
    #[default]
    Url,
    RichText,
}

impl ReviewUrlKind {
    pub fn filter_key(self) -> &'static str {
        match self {
            ReviewUrlKind::Url => "url",
            ReviewUrlKind::RichText => "rich_text",
        }
    }
}

/// Database column names for every synced field.
///
/// Names must match the database exactly. Any subset can be overridden in
/// the `[columns]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnMap {
    pub name: String,
    pub review_url: String,
    pub review_url_kind: ReviewUrlKind,
    pub year: String,
    pub runtime: String,
    pub poster: String,
    pub backdrop: String,
    pub trailer_url: String,
    pub original_title: String,
    pub synopsis: String,
    pub director: String,
    pub writer: String,
    pub cinematography: String,
    pub cast_top: String,
    pub countries: String,
    pub languages: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            name: "Name".into(),
            review_url: "Letterboxd URI".into(),
            review_url_kind: ReviewUrlKind::Url,
            year: "Year".into(),
            runtime: "Runtime (min)".into(),
            poster: "Poster".into(),
            backdrop: "Backdrop".into(),
            trailer_url: "Trailer URL".into(),
            original_title: "Original Title".into(),
            synopsis: "Overview / Plot".into(),
            director: "Director".into(),
            writer: "Writer".into(),
            cinematography: "Cinematography".into(),
            cast_top: "Cast Top".into(),
            countries: "Countries".into(),
            languages: "Languages".into(),
        }
    }
}

impl ColumnMap {
    pub fn column(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::Year => &self.year,
            MetadataField::Runtime => &self.runtime,
            MetadataField::Director => &self.director,
            MetadataField::Writer => &self.writer,
            MetadataField::Cinematographer => &self.cinematography,
            MetadataField::Poster => &self.poster,
            MetadataField::Backdrop => &self.backdrop,
            MetadataField::TrailerUrl => &self.trailer_url,
            MetadataField::OriginalTitle => &self.original_title,
            MetadataField::Synopsis => &self.synopsis,
            MetadataField::Countries => &self.countries,
            MetadataField::Languages => &self.languages,
            MetadataField::CastTop => &self.cast_top,
        }
    }
}
