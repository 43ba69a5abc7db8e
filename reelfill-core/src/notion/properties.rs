//! Typed database properties: decoding what a page holds and encoding the
//! values written back.

use reelfill_model::FieldValue;
use serde::Deserialize;
use serde_json::{Value, json};

/// Notion's limit for a single rich-text content string.
pub const TEXT_LIMIT: usize = 2000;
/// Notion's limit for select option and file names.
pub const NAME_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileUrl {
    pub url: String,
}

/// A file reference, used both for `files` properties and page covers.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileObject {
    External {
        external: FileUrl,
    },
    File {
        file: FileUrl,
    },
    #[serde(other)]
    Unsupported,
}

impl FileObject {
    pub fn url(&self) -> Option<&str> {
        let url = match self {
            FileObject::External { external } => &external.url,
            FileObject::File { file } => &file.url,
            FileObject::Unsupported => return None,
        };
        let url = url.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// A property value as returned on a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Property {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Number {
        #[serde(default)]
        number: Option<f64>,
    },
    Url {
        #[serde(default)]
        url: Option<String>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Files {
        #[serde(default)]
        files: Vec<FileObject>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Number,
    Url,
    MultiSelect,
    Files,
    Unsupported,
}

impl PropertyKind {
    /// Kinds the sync writes to. Titles are never rewritten.
    pub fn is_writable(self) -> bool {
        !matches!(self, PropertyKind::Title | PropertyKind::Unsupported)
    }
}

fn plain_text(parts: &[RichText]) -> Option<String> {
    let joined: String =
        parts.iter().map(|part| part.plain_text.as_str()).collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl Property {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Property::Title { .. } => PropertyKind::Title,
            Property::RichText { .. } => PropertyKind::RichText,
            Property::Number { .. } => PropertyKind::Number,
            Property::Url { .. } => PropertyKind::Url,
            Property::MultiSelect { .. } => PropertyKind::MultiSelect,
            Property::Files { .. } => PropertyKind::Files,
            Property::Unsupported => PropertyKind::Unsupported,
        }
    }

    /// Current value, or `None` when the property is empty or of an
    /// unsupported type.
    pub fn value(&self) -> Option<FieldValue> {
        match self {
            Property::Title { title: parts }
            | Property::RichText { rich_text: parts } => {
                plain_text(parts).map(FieldValue::Text)
            }
            Property::Number { number } => number
                .filter(|n| n.is_finite())
                .map(|n| FieldValue::Number(n.round() as i64)),
            Property::Url { url } => url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(|url| FieldValue::Text(url.to_string())),
            Property::MultiSelect { multi_select } => {
                let names: Vec<String> = multi_select
                    .iter()
                    .map(|option| option.name.trim())
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                (!names.is_empty()).then_some(FieldValue::List(names))
            }
            Property::Files { files } => files
                .iter()
                .find_map(FileObject::url)
                .map(|url| FieldValue::Text(url.to_string())),
            Property::Unsupported => None,
        }
    }

    /// Free text this property carries, searched for review links.
    pub fn text(&self) -> Option<String> {
        match self {
            Property::Title { .. }
            | Property::RichText { .. }
            | Property::Url { .. } => self.value().map(|value| value.as_text()),
            _ => None,
        }
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn number_of(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        other => other.as_text().trim().parse().ok(),
    }
}

/// Encodes `value` for a property of type `kind`. `None` when the value
/// cannot be written to that kind of property.
pub fn encode_value(kind: PropertyKind, value: &FieldValue) -> Option<Value> {
    match kind {
        PropertyKind::Number => {
            number_of(value).map(|number| json!({ "number": number }))
        }
        PropertyKind::RichText => Some(json!({
            "rich_text": [{
                "type": "text",
                "text": { "content": truncate(&value.as_text(), TEXT_LIMIT) },
            }],
        })),
        PropertyKind::Url => Some(json!({ "url": value.as_text() })),
        PropertyKind::MultiSelect => {
            let mut names: Vec<String> = Vec::new();
            for name in value.as_list() {
                // Commas are not allowed inside option names.
                let name = truncate(name.replace(',', " ").trim(), NAME_LIMIT);
                if !name.is_empty() && !names.contains(&name) {
                    names.push(name);
                }
            }
            let options: Vec<Value> = names
                .into_iter()
                .map(|name| json!({ "name": name }))
                .collect();
            Some(json!({ "multi_select": options }))
        }
        PropertyKind::Files => {
            let url = value.as_text();
            Some(json!({
                "files": [{
                    "type": "external",
                    "name": truncate(&url, NAME_LIMIT),
                    "external": { "url": url },
                }],
            }))
        }
        PropertyKind::Title | PropertyKind::Unsupported => None,
    }
}

/// Page-level cover pointing at an external image.
pub fn encode_cover(url: &str) -> Value {
    json!({ "type": "external", "external": { "url": url } })
}
