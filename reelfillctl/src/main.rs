//! # reelfill
//!
//! Walks a Notion movie database, resolves each row's Letterboxd link to a
//! film, and fills empty columns from OMDb (primary) and TMDb (secondary).

mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use reelfill_config::{ConfigLoad, ConfigLoader};
use reelfill_core::{
    http::HttpClients,
    notion::NotionClient,
    providers::{OmdbProvider, TmdbProvider, tmdb::ImageSizes},
    resolver::LetterboxdResolver,
    sync::{Enricher, SyncDriver, SyncOptions},
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }
    let ConfigLoad { config, warnings } =
        loader.load().context("failed to load configuration")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_file {
        info!(path = %path.display(), "loaded config file");
    }
    if !warnings.is_empty() {
        for warning in &warnings.items {
            match &warning.hint {
                Some(hint) => warn!(
                    message = %warning.message,
                    hint = %hint,
                    "configuration warning"
                ),
                None => {
                    warn!(message = %warning.message, "configuration warning")
                }
            }
        }
    }

    let (token, database_id) = config
        .notion_credentials()
        .context("database credentials are required")?;

    let clients = HttpClients::build(config.sync.http_timeout)
        .context("failed to build HTTP clients")?;
    let omdb = OmdbProvider::new(
        clients.standard.clone(),
        config.providers.omdb_api_key.clone(),
    );
    let tmdb = TmdbProvider::new(
        clients.standard.clone(),
        config.providers.tmdb_api_key.clone(),
        ImageSizes {
            poster: config.providers.poster_size,
            backdrop: config.providers.backdrop_size,
        },
    );
    let store = NotionClient::new(
        clients.standard.clone(),
        token.clone(),
        database_id,
        config.columns.clone(),
        config.sync.write_retry,
    );

    let driver = SyncDriver::new(
        Arc::new(store),
        Arc::new(LetterboxdResolver::new(&clients)),
        Enricher::new(Arc::new(omdb), Arc::new(tmdb)),
        SyncOptions {
            dry_run: cli.dry_run,
            overwrite: cli.overwrite,
            row_delay: config.sync.row_delay,
            cover_delay: config.sync.cover_delay,
        },
    );

    let report = driver
        .run(cli.mode(config.sync.default_limit))
        .await
        .context("sync aborted")?;
    info!(%report, dry_run = cli.dry_run, "done");
    Ok(())
}
