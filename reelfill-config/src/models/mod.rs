pub mod columns;
pub mod credential;
pub mod retry;
pub mod sources;

use std::{path::PathBuf, time::Duration};

use reelfill_model::{BackdropSize, PosterSize};

use crate::loader::error::ConfigLoadError;

use self::{columns::ColumnMap, credential::ApiCredential, retry::RetryPolicy};

/// Fully composed runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub notion: NotionConfig,
    pub providers: ProviderConfig,
    pub sync: SyncConfig,
    pub columns: ColumnMap,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct NotionConfig {
    pub token: Option<ApiCredential>,
    pub database_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub omdb_api_key: Option<ApiCredential>,
    pub tmdb_api_key: Option<ApiCredential>,
    pub poster_size: PosterSize,
    pub backdrop_size: BackdropSize,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Rows processed per run when `--limit` is not given; 0 = unlimited.
    pub default_limit: usize,
    /// Pause after each written row, keeping under the database rate limit.
    pub row_delay: Duration,
    /// Pause between cover writes in the cover pass.
    pub cover_delay: Duration,
    /// Client-side timeout applied to every outbound HTTP call.
    pub http_timeout: Duration,
    pub write_retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_limit: 0,
            row_delay: Duration::from_millis(200),
            cover_delay: Duration::from_millis(150),
            http_timeout: Duration::from_secs(20),
            write_retry: RetryPolicy::default(),
        }
    }
}

/// Where the configuration came from, for startup logging.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub env_file_loaded: bool,
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Database credentials, which every mode needs.
    pub fn notion_credentials(
        &self,
    ) -> Result<(&ApiCredential, &str), ConfigLoadError> {
        let token = self.notion.token.as_ref().ok_or(
            ConfigLoadError::MissingSecret {
                key: "NOTION_TOKEN",
            },
        )?;
        let database_id = self.notion.database_id.as_deref().ok_or(
            ConfigLoadError::MissingSecret {
                key: "NOTION_DATABASE_ID",
            },
        )?;
        Ok((token, database_id))
    }
}
