//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::sync::ConflictPolicy;

pub mod commands;

/// quotesync - local-first quote collection with background sync
#[derive(Parser, Debug)]
#[command(name = "qsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Record snapshot path (default: ~/.quotesync/records.json)
    #[arg(long, global = true, env = "QSYNC_STORE")]
    pub store: Option<PathBuf>,

    /// Remote collection URL
    #[arg(long, global = true, env = "QSYNC_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Never contact the remote; new records stay queued
    #[arg(long, global = true)]
    pub offline: bool,

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
    /// Add a quote and try to post it
    Add {
        /// Quote text
        text: String,

        /// Category (e.g. the author)
        category: String,
    },

    /// Import quotes from a JSON array of {text, category} objects
    Import {
        /// File to read, or `-` for stdin
        file: PathBuf,
    },

    /// Export quotes as a JSON array
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List quotes, optionally filtered
    List(FilterArgs),

    /// Show one random quote from the filtered view
    Random(FilterArgs),

    /// List distinct categories
    Categories,

    /// Run one sync cycle now
    Sync,

    /// Sync periodically until interrupted
    Watch {
        /// Seconds between cycles (default from config, 60)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show store and sync status
    Status,

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Shared filter flags for `list` and `random`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive keyword matched against text and category
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Exact category (case-insensitive)
    #[arg(short, long)]
    pub category: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show,

    /// Update config.json
    Set {
        /// Remote collection URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Seconds between periodic cycles
        #[arg(long)]
        interval: Option<u64>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// How to resolve same-content records with different ids
        #[arg(long)]
        conflict_policy: Option<ConflictPolicy>,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
