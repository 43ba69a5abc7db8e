use crate::models::Config;

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Non-fatal configuration gaps. Providers without a key are skipped at
/// runtime, so a missing key only degrades the result.
pub fn check_providers(config: &Config) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    match (
        config.providers.omdb_api_key.is_some(),
        config.providers.tmdb_api_key.is_some(),
    ) {
        (false, false) => warnings.push_with_hint(
            "Neither OMDB_API_KEY nor TMDB_API_KEY is set; no metadata can be fetched",
            "Set at least one provider key in the environment or .env",
        ),
        (false, true) => warnings.push(
            "OMDB_API_KEY not set; primary provider lookups are skipped",
        ),
        (true, false) => warnings.push(
            "TMDB_API_KEY not set; backdrops, trailers and cast are unavailable",
        ),
        (true, true) => {}
    }

    if config.sync.write_retry.max_attempts == 0 {
        warnings.push_with_hint(
            "write_retry_attempts is 0; database writes are attempted once",
            "Use a value of 1 or more in the [sync] table",
        );
    }

    warnings
}
