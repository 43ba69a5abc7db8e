use std::path::PathBuf;

use clap::Parser;
use reelfill_core::sync::SyncMode;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "reelfill", version)]
#[command(
    about = "Fill a Notion movie database with OMDb and TMDb metadata, keyed by each row's Letterboxd link"
)]
pub struct Cli {
    /// Maximum number of rows to process (0 = all). Defaults to
    /// REELFILL_DEFAULT_LIMIT or the config file.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Log what would be written without touching the database
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Replace populated columns when the providers disagree
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Only set page covers from existing backdrop values, then exit
    #[arg(long, default_value_t = false)]
    pub set_covers: bool,

    /// Re-sync rows edited within the last N hours (0 = off)
    #[arg(long, default_value_t = 0)]
    pub recent_hours: u32,

    /// Cap on rows visited in --recent-hours mode
    #[arg(long, default_value_t = 50)]
    pub recent_limit: usize,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(long, env = "REELFILL_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Cover mode wins over recent mode, which wins over the default fill.
    pub fn mode(&self, default_limit: usize) -> SyncMode {
        if self.set_covers {
            SyncMode::Covers
        } else if self.recent_hours > 0 {
            SyncMode::Recent {
                hours: self.recent_hours,
                limit: self.recent_limit,
            }
        } else {
            SyncMode::Fill {
                limit: self.limit.unwrap_or(default_limit),
            }
        }
    }
}
