use std::{fmt, sync::Arc};

use reelfill_model::{MovieIdentity, MovieRecord};
use tracing::debug;

use crate::providers::MetadataProvider;

/// One lookup in the precedence chain, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    PrimaryById,
    PrimaryByTitle,
    SecondaryById,
    SecondaryByTitle,
}

impl Lookup {
    const CHAIN: [Lookup; 4] = [
        Lookup::PrimaryById,
        Lookup::PrimaryByTitle,
        Lookup::SecondaryById,
        Lookup::SecondaryByTitle,
    ];
}

/// Queries the providers lazily: each lookup runs only while the merged
/// record is empty or still misses a core field.
#[derive(Clone)]
pub struct Enricher {
    primary: Arc<dyn MetadataProvider>,
    secondary: Arc<dyn MetadataProvider>,
}

impl fmt::Debug for Enricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enricher")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.name())
            .finish()
    }
}

impl Enricher {
    pub fn new(
        primary: Arc<dyn MetadataProvider>,
        secondary: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// Merged metadata for `identity`. `title_hint` stands in for the title
    /// when the identity has none.
    pub async fn gather(
        &self,
        identity: &MovieIdentity,
        title_hint: Option<&str>,
    ) -> MovieRecord {
        let title = identity
            .title
            .as_deref()
            .or(title_hint)
            .map(str::trim)
            .filter(|title| !title.is_empty());
        let year = identity.year;

        let mut merged = MovieRecord::default();
        for lookup in Lookup::CHAIN {
            if !merged.needs_fallback() {
                break;
            }
            if let Some(found) = self.run(lookup, identity, title, year).await
            {
                debug!(
                    ?lookup,
                    missing = ?merged.missing_core(),
                    "merging provider result"
                );
                merged.fill_missing_from(&found);
            }
        }
        merged
    }

    async fn run(
        &self,
        lookup: Lookup,
        identity: &MovieIdentity,
        title: Option<&str>,
        year: Option<i32>,
    ) -> Option<MovieRecord> {
        match lookup {
            Lookup::PrimaryById => {
                let imdb_id = identity.imdb_id.as_deref()?;
                self.primary.lookup_by_id(imdb_id).await
            }
            Lookup::PrimaryByTitle => {
                self.primary.lookup_by_title(title?, year).await
            }
            Lookup::SecondaryById => {
                let id = identity
                    .tmdb_id
                    .as_deref()
                    .or(identity.imdb_id.as_deref())?;
                self.secondary.lookup_by_id(id).await
            }
            Lookup::SecondaryByTitle => {
                self.secondary.lookup_by_title(title?, year).await
            }
        }
    }
}
