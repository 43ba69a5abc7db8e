//! Loading the optional TOML file and layering the environment on top.

use std::{collections::HashMap, io::Write, time::Duration};

use reelfill_config::{
    ConfigLoadError, ConfigLoader, EnvConfig, ReviewUrlKind,
};
use reelfill_model::{BackdropSize, MetadataField, PosterSize};

fn env(pairs: &[(&str, &str)]) -> EnvConfig {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvConfig::from_lookup(|key| map.get(key).cloned())
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn file_overrides_columns_and_image_sizes() {
    let file = write_config(
        r#"
[notion]
database_id = "from-file"

[tmdb]
poster_size = "w780"
backdrop_size = "original"

[sync]
default_limit = 40
row_delay = "1s"
write_retry_attempts = 3

[columns]
review_url = "Letterboxd"
review_url_kind = "rich_text"
synopsis = "Plot"
"#,
    );

    let parsed = ConfigLoader::load_file(file.path()).expect("parse");
    let load = ConfigLoader::compose(Some(parsed), env(&[])).expect("compose");
    let config = load.config;

    assert_eq!(config.notion.database_id.as_deref(), Some("from-file"));
    assert_eq!(config.providers.poster_size, PosterSize::W780);
    assert_eq!(config.providers.backdrop_size, BackdropSize::Original);
    assert_eq!(config.sync.default_limit, 40);
    assert_eq!(config.sync.row_delay, Duration::from_secs(1));
    assert_eq!(config.sync.write_retry.max_attempts, 3);
    assert_eq!(config.columns.review_url, "Letterboxd");
    assert_eq!(config.columns.review_url_kind, ReviewUrlKind::RichText);
    assert_eq!(config.columns.column(MetadataField::Synopsis), "Plot");
    // Columns not named in the file keep their defaults.
    assert_eq!(config.columns.column(MetadataField::Year), "Year");
}

#[test]
fn environment_wins_over_file() {
    let file = write_config(
        r#"
[notion]
database_id = "from-file"

[sync]
default_limit = 40
"#,
    );

    let parsed = ConfigLoader::load_file(file.path()).expect("parse");
    let load = ConfigLoader::compose(
        Some(parsed),
        env(&[
            ("NOTION_DATABASE_ID", "from-env"),
            ("REELFILL_DEFAULT_LIMIT", "5"),
        ]),
    )
    .expect("compose");

    assert_eq!(load.config.notion.database_id.as_deref(), Some("from-env"));
    assert_eq!(load.config.sync.default_limit, 5);
}

#[test]
fn malformed_file_reports_its_path() {
    let file = write_config("[sync\ndefault_limit = ");

    let err = ConfigLoader::load_file(file.path()).expect_err("bad toml");

    match err {
        ConfigLoadError::Parse { path, .. } => assert_eq!(path, file.path()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn explicit_missing_config_is_an_error() {
    let err = ConfigLoader::new()
        .with_config_path("/definitely/not/here/reelfill.toml")
        .load()
        .expect_err("missing file");

    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
}
