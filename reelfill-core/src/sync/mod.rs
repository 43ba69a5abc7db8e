//! Row selection, provider merging and write planning.

mod driver;
mod enrich;
mod plan;

pub use driver::{SyncDriver, SyncMode, SyncOptions, SyncReport};
pub use enrich::Enricher;
pub use plan::{FieldChange, RowUpdate, plan_update};
