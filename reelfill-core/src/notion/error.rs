use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Notion API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Failed to decode Notion response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl NotionError {
    /// Conflicts and rate limiting clear up on their own; everything else
    /// is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotionError::Api { status: 409 | 429, .. })
    }

    /// Delay the server asked for via `Retry-After`.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            NotionError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
