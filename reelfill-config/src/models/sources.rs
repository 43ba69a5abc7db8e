use std::path::PathBuf;

use reelfill_model::{BackdropSize, PosterSize};
use serde::{Deserialize, Serialize};

use super::columns::ColumnMap;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub notion: FileNotionConfig,
    #[serde(default)]
    pub tmdb: FileTmdbConfig,
    #[serde(default)]
    pub sync: FileSyncConfig,
    #[serde(default)]
    pub columns: ColumnMap,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileNotionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileTmdbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_size: Option<PosterSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_size: Option<BackdropSize>,
}

/// Durations are humantime strings such as `"200ms"` or `"20s"`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileSyncConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_retry_attempts: Option<u32>,
}

/// Environment-derived configuration values, kept raw until composition so
/// parse failures can name the offending key.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub notion_token: Option<String>,
    pub notion_database_id: Option<String>,
    pub omdb_api_key: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub default_limit: Option<String>,
    pub row_delay: Option<String>,
    pub http_timeout: Option<String>,
    pub config_path: Option<PathBuf>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the environment view from an arbitrary lookup, which keeps
    /// tests away from the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        Self {
            notion_token: value("NOTION_TOKEN"),
            notion_database_id: value("NOTION_DATABASE_ID"),
            omdb_api_key: value("OMDB_API_KEY"),
            tmdb_api_key: value("TMDB_API_KEY"),
            default_limit: value("REELFILL_DEFAULT_LIMIT"),
            row_delay: value("REELFILL_ROW_DELAY"),
            http_timeout: value("REELFILL_HTTP_TIMEOUT"),
            config_path: value("REELFILL_CONFIG").map(PathBuf::from),
        }
    }
}
