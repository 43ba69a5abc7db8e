use reelfill_model::{FieldValue, MetadataField, MovieRecord};

use crate::notion::MovieRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: MetadataField,
    pub value: FieldValue,
}

/// Everything one row write will change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowUpdate {
    pub changes: Vec<FieldChange>,
    /// New page cover URL.
    pub cover: Option<String>,
}

impl RowUpdate {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.cover.is_none()
    }

    pub fn fields(&self) -> Vec<MetadataField> {
        self.changes.iter().map(|change| change.field).collect()
    }
}

/// Decides what to write for `row` given the merged provider record.
///
/// Only columns present on the row are considered. Without `overwrite`
/// a field is written only when the row holds no value for it; with
/// `overwrite` every differing non-empty value is written. Running the
/// plan again after a successful write yields an empty update.
pub fn plan_update(
    row: &MovieRow,
    merged: &MovieRecord,
    overwrite: bool,
) -> RowUpdate {
    let mut update = RowUpdate::default();

    for field in MetadataField::ALL {
        if row.column_kind(field).is_none() {
            continue;
        }
        let Some(value) = merged.value(field) else {
            continue;
        };
        let write = match row.current.value(field) {
            None => true,
            Some(existing) => overwrite && existing != value,
        };
        if write {
            update.changes.push(FieldChange { field, value });
        }
    }

    let writes_backdrop = update
        .changes
        .iter()
        .any(|change| change.field == MetadataField::Backdrop);
    if let Some(FieldValue::Text(backdrop)) =
        merged.value(MetadataField::Backdrop)
        && (writes_backdrop || overwrite)
        && row.cover_url.as_deref() != Some(backdrop.as_str())
    {
        update.cover = Some(backdrop);
    }

    update
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::notion::PropertyKind;

    fn row() -> MovieRow {
        let columns = BTreeMap::from([
            (MetadataField::Year, PropertyKind::Number),
            (MetadataField::Director, PropertyKind::RichText),
            (MetadataField::Backdrop, PropertyKind::Url),
            (MetadataField::Countries, PropertyKind::MultiSelect),
        ]);
        MovieRow {
            id: "page-1".into(),
            review_url: Some("https://boxd.it/5E3o".into()),
            current: MovieRecord {
                year: Some(2023),
                ..MovieRecord::default()
            },
            columns,
            ..MovieRow::default()
        }
    }

    fn merged() -> MovieRecord {
        MovieRecord {
            year: Some(2022),
            director: Some("Celine Song".into()),
            backdrop_url: Some("https://image.tmdb.org/t/p/w1280/b.jpg".into()),
            countries: vec!["United States".into(), "South Korea".into()],
            synopsis: Some("Not a column on this row".into()),
            ..MovieRecord::default()
        }
    }

    #[test]
    fn fills_only_empty_columns_present_on_the_row() {
        let update = plan_update(&row(), &merged(), false);

        assert_eq!(
            update.fields(),
            vec![
                MetadataField::Director,
                MetadataField::Backdrop,
                MetadataField::Countries,
            ]
        );
        assert_eq!(
            update.cover.as_deref(),
            Some("https://image.tmdb.org/t/p/w1280/b.jpg")
        );
    }

    #[test]
    fn overwrite_replaces_differing_values() {
        let update = plan_update(&row(), &merged(), true);

        assert_eq!(update.changes[0].field, MetadataField::Year);
        assert_eq!(update.changes[0].value, FieldValue::Number(2022));
    }

    #[test]
    fn replanning_after_a_write_is_a_no_op() {
        let mut written = row();
        let update = plan_update(&written, &merged(), false);
        for change in &update.changes {
            written.current.set(change.field, change.value.clone());
        }
        written.cover_url = update.cover.clone();

        assert!(plan_update(&written, &merged(), false).is_empty());
    }

    #[test]
    fn nothing_found_means_nothing_to_write() {
        let update = plan_update(&row(), &MovieRecord::default(), true);

        assert!(update.is_empty());
    }
}
