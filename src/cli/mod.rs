//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use admin_log_backup::application::OutputFormat;
use admin_log_backup::domain::{ExportRequest, ThreadSelector};

/// Admin Log Backup - recover deleted messages and media from a group's admin log.
///
/// Example: admin-log-backup export --group -1002074491972 --threads "[1, 2]" --events log.json
#[derive(Parser, Debug)]
#[command(name = "admin-log-backup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file (default: ~/.admin-log-backup/config.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Root of the backup tree (overrides the config file).
    #[arg(short, long)]
    pub backup_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recover deleted messages into the backup tree.
    Export {
        /// Group or channel id (sign is ignored).
        #[arg(short, long, allow_negative_numbers = true)]
        group: i64,

        /// Export mode: 1 - all, 2 - media only, 3 - text only.
        #[arg(short, long, default_value = "1")]
        mode: u8,

        /// Minimum message id (0 to start from the first).
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        min_id: i64,

        /// Maximum id (0 to retrieve all).
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        max_id: i64,

        /// Only keep messages deleted by this user (0 for no filter).
        #[arg(short = 'u', long, default_value = "0", allow_negative_numbers = true)]
        filter_user: i64,

        /// Threads to export: 0 for the whole group, an id, or a list like "[1, 2]".
        #[arg(short, long, default_value = "0")]
        threads: String,

        /// Recorded admin-log export to read deletion events from.
        #[arg(short, long)]
        events: PathBuf,

        /// Folder holding the files referenced by media entries.
        #[arg(long)]
        media_dir: Option<PathBuf>,

        /// Events requested per page (overrides the config file).
        #[arg(long)]
        page_size: Option<usize>,

        /// Pause after each media download in milliseconds (overrides the config file).
        #[arg(long)]
        pacing_ms: Option<u64>,
    },

    /// List backed-up groups and their threads.
    Groups,

    /// Show the recovered messages of a group or thread.
    Show {
        /// Group id (sign is ignored).
        #[arg(short, long, allow_negative_numbers = true)]
        group: i64,

        /// Thread id (0 for the unscoped dump).
        #[arg(short, long, default_value = "0")]
        thread: i64,

        /// Show only the last N messages.
        #[arg(short, long)]
        last: Option<usize>,

        /// Output format: table or json.
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Write a default configuration file if none exists.
    InitConfig,
}

impl Commands {
    /// Builds the run request of an `export` command.
    ///
    /// Returns `None` for other commands.
    pub fn export_request(&self) -> Option<Result<ExportRequest, String>> {
        let Self::Export {
            group,
            mode,
            min_id,
            max_id,
            filter_user,
            threads,
            ..
        } = self
        else {
            return None;
        };

        let threads = if threads.trim().is_empty() {
            Ok(ThreadSelector::unscoped())
        } else {
            threads.parse::<ThreadSelector>().map_err(|e| e.to_string())
        };

        Some(threads.map(|threads| ExportRequest {
            group_id: *group,
            mode: *mode,
            min_id: *min_id,
            max_id: *max_id,
            filter_user_id: *filter_user,
            threads,
        }))
    }
}

/// Parses a `--format` value.
pub fn parse_format(format: &str) -> Result<OutputFormat, String> {
    format.parse()
}
