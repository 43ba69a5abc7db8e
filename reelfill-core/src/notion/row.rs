use std::collections::BTreeMap;

use reelfill_config::ColumnMap;
use reelfill_model::{MetadataField, MovieRecord};
use serde::Deserialize;

use crate::resolver::find_review_url;

use super::properties::{FileObject, Property, PropertyKind};

/// A database page as returned by queries.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Property>,
    #[serde(default)]
    pub cover: Option<FileObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// One movie row, decoded through the configured column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieRow {
    pub id: String,
    /// Display title from the title column.
    pub title: Option<String>,
    /// Join key: the review link from its column, else the first review
    /// link found in any text or URL property.
    pub review_url: Option<String>,
    /// Values currently stored in the mapped columns.
    pub current: MovieRecord,
    pub cover_url: Option<String>,
    /// Writable mapped columns present on the page, by field.
    pub columns: BTreeMap<MetadataField, PropertyKind>,
}

impl MovieRow {
    pub fn from_page(page: &Page, columns: &ColumnMap) -> Self {
        let mut current = MovieRecord::default();
        let mut kinds = BTreeMap::new();
        for field in MetadataField::ALL {
            let Some(property) = page.properties.get(columns.column(field))
            else {
                continue;
            };
            if let Some(value) = property.value() {
                current.set(field, value);
            }
            if property.kind().is_writable() {
                kinds.insert(field, property.kind());
            }
        }

        let title = page
            .properties
            .get(&columns.name)
            .or_else(|| {
                page.properties
                    .values()
                    .find(|property| property.kind() == PropertyKind::Title)
            })
            .and_then(Property::value)
            .map(|value| value.as_text());

        let review_url = page
            .properties
            .get(&columns.review_url)
            .and_then(Property::text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .or_else(|| {
                page.properties
                    .values()
                    .filter_map(Property::text)
                    .find_map(|text| find_review_url(&text))
            });

        Self {
            id: page.id.clone(),
            title,
            review_url,
            current,
            cover_url: page
                .cover
                .as_ref()
                .and_then(FileObject::url)
                .map(str::to_string),
            columns: kinds,
        }
    }

    pub fn column_kind(&self, field: MetadataField) -> Option<PropertyKind> {
        self.columns.get(&field).copied()
    }

    /// Whether any writable mapped column is still empty.
    pub fn needs_fill(&self) -> bool {
        self.columns.keys().any(|field| !self.current.has(*field))
    }
}
