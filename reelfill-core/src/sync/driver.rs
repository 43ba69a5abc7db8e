use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::sleep;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{
    Result,
    notion::{MovieRow, MovieStore},
    resolver::IdentityResolver,
};

use super::{enrich::Enricher, plan::plan_update};

/// Which rows a run visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Rows with a review link and at least one empty column, up to
    /// `limit` (0 = unlimited).
    Fill { limit: usize },
    /// Rows edited in the last `hours`, up to `limit`, whether or not they
    /// have empty columns.
    Recent { hours: u32, limit: usize },
    /// Sets the page cover of every row that has a backdrop but no cover.
    Covers,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Log planned writes instead of performing them.
    pub dry_run: bool,
    /// Replace populated columns with differing provider values.
    pub overwrite: bool,
    /// Pause after each written row.
    pub row_delay: Duration,
    /// Pause after each cover write in [`SyncMode::Covers`].
    pub cover_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            overwrite: false,
            row_delay: Duration::from_millis(200),
            cover_delay: Duration::from_millis(150),
        }
    }
}

/// Row counts for one run. Under `dry_run`, `updated` counts rows that
/// would have been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub scanned: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned={} updated={} skipped={} failed={}",
            self.scanned, self.updated, self.skipped, self.failed
        )
    }
}

/// Start of the recent-edits window. Windows reaching past the Unix epoch
/// are clamped to it; the database holds nothing older.
fn edited_since(now: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    let epoch = DateTime::<Utc>::UNIX_EPOCH;
    TimeDelta::try_hours(i64::from(hours))
        .and_then(|window| now.checked_sub_signed(window))
        .map_or(epoch, |since| since.max(epoch))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Updated,
    Skipped,
    Failed,
}

impl SyncReport {
    fn record(&mut self, outcome: RowOutcome) {
        self.scanned += 1;
        match outcome {
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Failed => self.failed += 1,
        }
    }
}

/// Sequential driver: one row at a time, every failure confined to its
/// row.
#[derive(Clone)]
pub struct SyncDriver {
    store: Arc<dyn MovieStore>,
    resolver: Arc<dyn IdentityResolver>,
    enricher: Enricher,
    options: SyncOptions,
}

impl fmt::Debug for SyncDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncDriver")
            .field("enricher", &self.enricher)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SyncDriver {
    pub fn new(
        store: Arc<dyn MovieStore>,
        resolver: Arc<dyn IdentityResolver>,
        enricher: Enricher,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            resolver,
            enricher,
            options,
        }
    }

    /// Runs `mode` to completion. Only the initial row query can fail the
    /// run; per-row errors are logged and counted.
    pub async fn run(&self, mode: SyncMode) -> Result<SyncReport> {
        info!(
            ?mode,
            dry_run = self.options.dry_run,
            overwrite = self.options.overwrite,
            "starting sync"
        );

        let report = match mode {
            SyncMode::Fill { limit } => {
                let rows = self.store.rows_needing_fill(limit).await?;
                self.process_rows(rows).await
            }
            SyncMode::Recent { hours, limit } => {
                let since = edited_since(Utc::now(), hours);
                let rows = self.store.recent_rows(since, limit).await?;
                self.process_rows(rows).await
            }
            SyncMode::Covers => {
                let rows = self.store.all_rows().await?;
                self.set_covers(rows).await
            }
        };

        info!(
            scanned = report.scanned,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "sync finished"
        );
        Ok(report)
    }

    async fn process_rows(&self, rows: Vec<MovieRow>) -> SyncReport {
        let total = rows.len();
        let mut report = SyncReport::default();

        for (index, row) in rows.iter().enumerate() {
            let span = info_span!(
                "row",
                n = index + 1,
                total,
                page_id = %row.id,
            );
            let outcome = self.process_row(row).instrument(span).await;
            report.record(outcome);
        }

        report
    }

    async fn process_row(&self, row: &MovieRow) -> RowOutcome {
        let Some(review_url) = row.review_url.as_deref() else {
            info!(title = ?row.title, "skipped: no review link");
            return RowOutcome::Skipped;
        };

        let identity = self.resolver.resolve(review_url).await;
        if identity.is_empty() {
            debug!(review_url, "review link told us nothing, using row title");
        }
        debug!(
            review_url,
            title = ?identity.title,
            year = ?identity.year,
            imdb_id = ?identity.imdb_id,
            tmdb_id = ?identity.tmdb_id,
            "resolved identity"
        );

        let merged =
            self.enricher.gather(&identity, row.title.as_deref()).await;
        if merged.is_empty() {
            info!(review_url, "skipped: no data found");
            return RowOutcome::Skipped;
        }

        let update = plan_update(row, &merged, self.options.overwrite);
        if update.is_empty() {
            info!(review_url, "skipped: nothing to write");
            return RowOutcome::Skipped;
        }

        let fields: Vec<&str> =
            update.fields().into_iter().map(|field| field.as_str()).collect();
        if self.options.dry_run {
            info!(?fields, cover = ?update.cover, "dry run: would update");
            return RowOutcome::Updated;
        }

        match self.store.write_row(row, &update).await {
            Ok(()) => {
                info!(?fields, cover = update.cover.is_some(), "updated");
                sleep(self.options.row_delay).await;
                RowOutcome::Updated
            }
            Err(err) => {
                error!(error = %err, ?fields, "failed to update row");
                RowOutcome::Failed
            }
        }
    }

    async fn set_covers(&self, rows: Vec<MovieRow>) -> SyncReport {
        let mut report = SyncReport::default();

        for row in &rows {
            let backdrop = row
                .current
                .backdrop_url
                .as_deref()
                .filter(|url| !url.trim().is_empty());
            let outcome = match backdrop {
                Some(url) if row.cover_url.is_none() => {
                    self.set_cover(row, url).await
                }
                _ => RowOutcome::Skipped,
            };
            report.record(outcome);
        }

        report
    }

    async fn set_cover(&self, row: &MovieRow, url: &str) -> RowOutcome {
        if self.options.dry_run {
            info!(page_id = %row.id, url, "dry run: would set cover");
            return RowOutcome::Updated;
        }
        let outcome = match self.store.set_cover(row, url).await {
            Ok(()) => {
                debug!(page_id = %row.id, url, "cover set");
                RowOutcome::Updated
            }
            Err(err) => {
                warn!(page_id = %row.id, error = %err, "failed to set cover");
                RowOutcome::Failed
            }
        };
        sleep(self.options.cover_delay).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use mockall::predicate::always;
    use reelfill_model::{MetadataField, MovieIdentity, MovieRecord};

    use super::*;
    use crate::{
        notion::{MockMovieStore, NotionError, PropertyKind},
        providers::MockMetadataProvider,
        resolver::MockIdentityResolver,
    };

    fn options() -> SyncOptions {
        SyncOptions {
            row_delay: Duration::ZERO,
            cover_delay: Duration::ZERO,
            ..SyncOptions::default()
        }
    }

    fn row(id: &str, review_url: Option<&str>) -> MovieRow {
        MovieRow {
            id: id.into(),
            title: Some("Past Lives".into()),
            review_url: review_url.map(str::to_string),
            columns: BTreeMap::from([
                (MetadataField::Year, PropertyKind::Number),
                (MetadataField::Director, PropertyKind::RichText),
            ]),
            ..MovieRow::default()
        }
    }

    fn provider(found: Option<MovieRecord>) -> MockMetadataProvider {
        let mut provider = MockMetadataProvider::new();
        provider.expect_name().return_const("mock");
        let by_id = found.clone();
        provider
            .expect_lookup_by_id()
            .returning(move |_| by_id.clone());
        provider
            .expect_lookup_by_title()
            .returning(move |_, _| found.clone());
        provider
    }

    fn resolver() -> MockIdentityResolver {
        let mut resolver = MockIdentityResolver::new();
        resolver.expect_resolve().returning(|_| MovieIdentity {
            title: Some("Past Lives".into()),
            year: Some(2023),
            ..MovieIdentity::default()
        });
        resolver
    }

    fn driver(
        store: MockMovieStore,
        found: Option<MovieRecord>,
        options: SyncOptions,
    ) -> SyncDriver {
        SyncDriver::new(
            Arc::new(store),
            Arc::new(resolver()),
            Enricher::new(
                Arc::new(provider(found)),
                Arc::new(provider(None)),
            ),
            options,
        )
    }

    fn found() -> MovieRecord {
        MovieRecord {
            year: Some(2023),
            director: Some("Celine Song".into()),
            ..MovieRecord::default()
        }
    }

    #[tokio::test]
    async fn failed_write_does_not_stop_the_run() {
        let mut store = MockMovieStore::new();
        store.expect_rows_needing_fill().returning(|_| {
            Ok(vec![
                row("a", Some("https://boxd.it/a")),
                row("b", None),
                row("c", Some("https://boxd.it/c")),
            ])
        });
        store
            .expect_write_row()
            .withf(|row, _| row.id == "a")
            .times(1)
            .returning(|_, _| {
                Err(NotionError::Api {
                    status: 400,
                    code: "validation_error".into(),
                    message: "bad".into(),
                    retry_after: None,
                })
            });
        store
            .expect_write_row()
            .withf(|row, _| row.id == "c")
            .times(1)
            .returning(|_, _| Ok(()));

        let report = driver(store, Some(found()), options())
            .run(SyncMode::Fill { limit: 0 })
            .await
            .expect("run");

        assert_eq!(
            report,
            SyncReport {
                scanned: 3,
                updated: 1,
                skipped: 1,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn failed_row_query_aborts_the_run() {
        let mut store = MockMovieStore::new();
        store.expect_all_rows().returning(|| {
            Err(NotionError::Api {
                status: 401,
                code: "unauthorized".into(),
                message: "API token is invalid.".into(),
                retry_after: None,
            })
        });

        let result =
            driver(store, None, options()).run(SyncMode::Covers).await;

        assert!(matches!(result, Err(crate::SyncError::Database(_))));
    }

    #[test]
    fn recent_window_is_clamped_to_the_epoch() {
        let now = Utc::now();

        assert_eq!(edited_since(now, 24), now - TimeDelta::hours(24));
        assert_eq!(
            edited_since(now, u32::MAX),
            DateTime::<Utc>::UNIX_EPOCH
        );
    }

    #[tokio::test]
    async fn huge_recent_window_queries_from_the_epoch() {
        let mut store = MockMovieStore::new();
        store
            .expect_recent_rows()
            .withf(|since, limit| {
                *since == DateTime::<Utc>::UNIX_EPOCH && *limit == 50
            })
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let report = driver(store, None, options())
            .run(SyncMode::Recent {
                hours: u32::MAX,
                limit: 50,
            })
            .await
            .expect("run");

        assert_eq!(report, SyncReport::default());
    }

    #[tokio::test]
    async fn dry_run_never_writes() {
        let mut store = MockMovieStore::new();
        store
            .expect_rows_needing_fill()
            .returning(|_| Ok(vec![row("a", Some("https://boxd.it/a"))]));
        store.expect_write_row().never();

        let options = SyncOptions {
            dry_run: true,
            ..options()
        };
        let report = driver(store, Some(found()), options)
            .run(SyncMode::Fill { limit: 10 })
            .await
            .expect("run");

        assert_eq!(report.updated, 1);
    }

    #[tokio::test]
    async fn rows_without_provider_data_are_skipped() {
        let mut store = MockMovieStore::new();
        store
            .expect_recent_rows()
            .with(always(), mockall::predicate::eq(50))
            .returning(|_, _| Ok(vec![row("a", Some("https://boxd.it/a"))]));
        store.expect_write_row().never();

        let report = driver(store, None, options())
            .run(SyncMode::Recent {
                hours: 24,
                limit: 50,
            })
            .await
            .expect("run");

        assert_eq!(report.skipped, 1);
        assert_eq!(report.updated, 0);
    }

    #[tokio::test]
    async fn cover_pass_only_touches_rows_without_a_cover() {
        let backdrop = "https://image.tmdb.org/t/p/w1280/b.jpg";
        let mut with_backdrop = row("a", None);
        with_backdrop.current.backdrop_url = Some(backdrop.into());
        let mut already_covered = with_backdrop.clone();
        already_covered.id = "b".into();
        already_covered.cover_url = Some("https://img/old.jpg".into());
        let no_backdrop = row("c", None);

        let mut store = MockMovieStore::new();
        store.expect_all_rows().returning(move || {
            Ok(vec![
                with_backdrop.clone(),
                already_covered.clone(),
                no_backdrop.clone(),
            ])
        });
        store
            .expect_set_cover()
            .withf(move |row, url| row.id == "a" && url == backdrop)
            .times(1)
            .returning(|_, _| Ok(()));

        let report = driver(store, None, options())
            .run(SyncMode::Covers)
            .await
            .expect("run");

        assert_eq!(report.scanned, 3);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 2);
    }
}
