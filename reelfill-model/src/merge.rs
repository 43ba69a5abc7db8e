use crate::record::MovieRecord;

/// Folds provider records into one, in precedence order.
///
/// The first non-empty value seen for each field wins; later records only
/// fill fields that are still empty. Missing records (`None`) are skipped.
/// The result may still contain empty fields when no source had a value.
pub fn merge<'a, I>(records: I) -> MovieRecord
where
    I: IntoIterator<Item = Option<&'a MovieRecord>>,
{
    records
        .into_iter()
        .flatten()
        .fold(MovieRecord::default(), |mut merged, record| {
            merged.fill_missing_from(record);
            merged
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_empty_value_wins() {
        let a = MovieRecord {
            director: Some("A".into()),
            ..MovieRecord::default()
        };
        let b = MovieRecord {
            director: Some("B".into()),
            writer: Some("W".into()),
            ..MovieRecord::default()
        };

        let merged = merge([None, Some(&a), Some(&b)]);

        assert_eq!(merged.director.as_deref(), Some("A"));
        assert_eq!(merged.writer.as_deref(), Some("W"));
        assert_eq!(merged.year, None);
    }

    #[test]
    fn empty_input_yields_empty_record() {
        let merged = merge(Vec::<Option<&MovieRecord>>::new());
        assert!(merged.is_empty());
    }
}
