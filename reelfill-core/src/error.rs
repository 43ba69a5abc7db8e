use thiserror::Error;

use crate::notion::NotionError;

/// Errors that stop a run before or while selecting rows.
///
/// Per-row failures never surface here; the driver logs and counts them.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] NotionError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
