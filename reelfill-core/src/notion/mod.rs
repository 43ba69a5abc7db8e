mod client;
mod error;
pub mod properties;
mod row;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::sync::RowUpdate;

pub use client::{
    NotionClient, edited_since_filter, review_url_filter, update_body,
};
pub use error::NotionError;
pub use properties::{Property, PropertyKind};
pub use row::{MovieRow, Page, QueryResponse};

/// The movie database the sync reads rows from and writes metadata to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Rows with a review link and at least one empty mapped column, up to
    /// `limit` rows (0 = unlimited).
    async fn rows_needing_fill(
        &self,
        limit: usize,
    ) -> Result<Vec<MovieRow>, NotionError>;

    /// Rows edited at or after `since`, newest first, capped at `limit`
    /// before rows without a review link are dropped.
    async fn recent_rows(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MovieRow>, NotionError>;

    async fn all_rows(&self) -> Result<Vec<MovieRow>, NotionError>;

    /// Writes the planned changes (and cover) to `row`.
    async fn write_row(
        &self,
        row: &MovieRow,
        update: &RowUpdate,
    ) -> Result<(), NotionError>;

    async fn set_cover(
        &self,
        row: &MovieRow,
        url: &str,
    ) -> Result<(), NotionError>;
}
