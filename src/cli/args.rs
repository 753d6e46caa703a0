//! CLI argument definitions using clap derive

use crate::cache::EvictionOrder;
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// imgcache - container image eviction planner
///
/// Replays recorded image activity against a usage-scored, pin-aware
/// cache and reports which images are safe to reclaim.
#[derive(Parser, Debug)]
#[command(name = "imgcache")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "IMGCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay an image event log and rank evictable images
    Replay(ReplayArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the replay command
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// JSON-lines event log
    pub events: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Capacity limit in GB (default: from config)
    #[arg(long)]
    pub max_size_gb: Option<u32>,

    /// Ranking direction (default: from config)
    #[arg(long)]
    pub order: Option<EvictionOrder>,

    /// Rank as of this RFC3339 time instead of the last event
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,

    /// Fail on the first event that references an untracked image
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Dot-separated key (e.g. cache.max_size_gb)
        key: String,

        /// Value to set
        value: String,
    },
}

/// Output format for listing commands
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
