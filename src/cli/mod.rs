//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// MediaSync CLI - Sync orchestration and run history for media libraries
#[derive(Parser, Debug)]
#[command(name = "msync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.mediasync/data/mediasync.db)
    #[arg(long, global = true, env = "MSYNC_DB")]
    pub db: Option<PathBuf>,

    /// Config file path (default: ~/.mediasync/config.json)
    #[arg(long, global = true, env = "MSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the history database
    Init {
        /// Overwrite existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Show last-run status for each sync action
    Status {
        /// Only show this account
        #[arg(long)]
        account: Option<i64>,
    },

    /// List recorded sync runs
    History(HistoryArgs),

    /// Run a sync and wait for it to finish
    Run(RunArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Account ID
    #[arg(long, short)]
    pub account: i64,

    /// Only runs of this mode (full, pull, fast_pull, push)
    #[arg(long, short)]
    pub mode: Option<String>,

    /// Only runs for this target section
    #[arg(long, short)]
    pub target: Option<String>,

    /// Maximum rows to show
    #[arg(long, short, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Sync mode (full, pull, fast_pull, push)
    pub mode: String,

    /// Account ID
    #[arg(long, short)]
    pub account: i64,

    /// Data scope (all, collection, playback, ratings, watched, watchlist, lists)
    #[arg(long, default_value = "all")]
    pub data: String,

    /// Media scope (all, movies, shows)
    #[arg(long, default_value = "all")]
    pub media: String,

    /// Section key to push (push only)
    #[arg(long, short)]
    pub target: Option<String>,

    /// Number of items the simulated worker processes
    #[arg(long, default_value_t = 20)]
    pub items: u64,

    /// Number of items that fail
    #[arg(long, default_value_t = 0)]
    pub fail: u64,

    /// Delay per item in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,

    /// Request cancellation after this many milliseconds
    #[arg(long)]
    pub cancel_after_ms: Option<u64>,
}
