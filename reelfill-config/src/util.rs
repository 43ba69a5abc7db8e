use std::time::Duration;

use crate::loader::error::ConfigLoadError;

/// Parses a humantime duration (`"200ms"`, `"20s"`, `"1m 30s"`).
pub fn parse_duration(
    key: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|err| {
        ConfigLoadError::InvalidValue {
            key,
            reason: format!("'{raw}' is not a duration ({err})"),
        }
    })
}

pub fn parse_count(
    key: &'static str,
    raw: &str,
) -> Result<usize, ConfigLoadError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|err| ConfigLoadError::InvalidValue {
            key,
            reason: format!("'{raw}' is not a non-negative integer ({err})"),
        })
}
