pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    models::{
        Config, ConfigMetadata, NotionConfig, ProviderConfig, SyncConfig,
        credential::ApiCredential,
        sources::{EnvConfig, FileConfig},
    },
    util::{parse_count, parse_duration},
    validation::{self, ConfigWarnings},
};

use self::error::ConfigLoadError;

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["reelfill.toml", "config/reelfill.toml"];

/// A composed configuration plus the warnings gathered while composing it.
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true)?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| {
                if err.not_found() { Ok(false) } else { Err(err) }
            })?,
        };

        let env = EnvConfig::gather();
        let config_path = self.resolve_config_path(&env)?;
        let file_config = match &config_path {
            Some(path) => Some(Self::load_file(path)?),
            None => None,
        };

        let mut load = Self::compose(file_config, env)?;
        load.config.metadata = ConfigMetadata {
            env_file_loaded,
            config_file: config_path,
        };
        Ok(load)
    }

    fn resolve_config_path(
        &self,
        env: &EnvConfig,
    ) -> Result<Option<PathBuf>, ConfigLoadError> {
        let explicit = self.config_path.clone().or(env.config_path.clone());
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok(Some(path));
        }

        Ok(DEFAULT_CONFIG_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists()))
    }

    /// Reads and parses a TOML config file.
    pub fn load_file(path: &Path) -> Result<FileConfig, ConfigLoadError> {
        debug!(path = %path.display(), "reading config file");
        let contents =
            fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
                path: path.to_path_buf(),
                source: err,
            })?;
        toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source: err,
        })
    }

    /// Composes defaults, file values and environment values; the
    /// environment wins over the file.
    pub fn compose(
        file_config: Option<FileConfig>,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let FileConfig {
            notion: file_notion,
            tmdb: file_tmdb,
            sync: file_sync,
            columns,
        } = file_config.unwrap_or_default();

        let notion = NotionConfig {
            token: env.notion_token.and_then(ApiCredential::new),
            database_id: env
                .notion_database_id
                .or(file_notion.database_id)
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        };

        let providers = ProviderConfig {
            omdb_api_key: env.omdb_api_key.and_then(ApiCredential::new),
            tmdb_api_key: env.tmdb_api_key.and_then(ApiCredential::new),
            poster_size: file_tmdb.poster_size.unwrap_or_default(),
            backdrop_size: file_tmdb.backdrop_size.unwrap_or_default(),
        };

        let defaults = SyncConfig::default();
        let default_limit = match env.default_limit.as_deref() {
            Some(raw) => parse_count("REELFILL_DEFAULT_LIMIT", raw)?,
            None => file_sync.default_limit.unwrap_or(defaults.default_limit),
        };
        let row_delay = match env.row_delay.or(file_sync.row_delay) {
            Some(raw) => parse_duration("REELFILL_ROW_DELAY", &raw)?,
            None => defaults.row_delay,
        };
        let http_timeout = match env.http_timeout.or(file_sync.http_timeout) {
            Some(raw) => parse_duration("REELFILL_HTTP_TIMEOUT", &raw)?,
            None => defaults.http_timeout,
        };
        let mut write_retry = defaults.write_retry;
        if let Some(attempts) = file_sync.write_retry_attempts {
            write_retry.max_attempts = attempts;
        }

        let sync = SyncConfig {
            default_limit,
            row_delay,
            http_timeout,
            write_retry,
            ..defaults
        };

        let config = Config {
            notion,
            providers,
            sync,
            columns,
            metadata: ConfigMetadata::default(),
        };
        let warnings = validation::check_providers(&config);

        Ok(ConfigLoad { config, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, time::Duration};

    fn env(pairs: &[(&str, &str)]) -> EnvConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let load = ConfigLoader::compose(None, env(&[])).expect("compose");

        assert_eq!(load.config.sync.default_limit, 0);
        assert_eq!(load.config.sync.row_delay, Duration::from_millis(200));
        assert_eq!(load.config.sync.http_timeout, Duration::from_secs(20));
        assert_eq!(load.config.columns.review_url, "Letterboxd URI");
        assert!(!load.warnings.is_empty());
    }

    #[test]
    fn environment_values_are_parsed() {
        let load = ConfigLoader::compose(
            None,
            env(&[
                ("NOTION_TOKEN", "secret_abc"),
                ("NOTION_DATABASE_ID", " db-123 "),
                ("OMDB_API_KEY", "abcd1234"),
                ("TMDB_API_KEY", "0123456789abcdef0123456789abcdef"),
                ("REELFILL_DEFAULT_LIMIT", "25"),
                ("REELFILL_ROW_DELAY", "350ms"),
            ]),
        )
        .expect("compose");

        let (token, database_id) =
            load.config.notion_credentials().expect("credentials");
        assert_eq!(token.expose(), "secret_abc");
        assert_eq!(database_id, "db-123");
        assert_eq!(load.config.sync.default_limit, 25);
        assert_eq!(load.config.sync.row_delay, Duration::from_millis(350));
        assert!(load.warnings.is_empty());
    }

    #[test]
    fn invalid_limit_names_the_key() {
        let err = ConfigLoader::compose(
            None,
            env(&[("REELFILL_DEFAULT_LIMIT", "many")]),
        )
        .expect_err("limit must be numeric");

        assert!(matches!(
            err,
            ConfigLoadError::InvalidValue {
                key: "REELFILL_DEFAULT_LIMIT",
                ..
            }
        ));
    }

    #[test]
    fn missing_database_credentials_are_reported() {
        let load = ConfigLoader::compose(None, env(&[("NOTION_TOKEN", "t")]))
            .expect("compose");

        let err = load
            .config
            .notion_credentials()
            .expect_err("database id missing");
        assert!(matches!(
            err,
            ConfigLoadError::MissingSecret {
                key: "NOTION_DATABASE_ID"
            }
        ));
    }
}
