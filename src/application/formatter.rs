//! Output formatting for backups and run progress.
//!
//! Supports table and JSON views of a dump, plus the run summaries.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{CapturedRecord, ExportScope, PassOutcome, PassReport, RunSummary};
use crate::infrastructure::GroupListing;

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Compact table listing.
    #[default]
    Table,
    /// JSON format for programmatic use.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Use: table, json")),
        }
    }
}

/// Formats captured records as a table.
pub fn format_records_table(records: &[CapturedRecord]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Date", "Media", "Text"]);

    for record in records {
        let id = record
            .message_id()
            .map_or_else(|| "-".to_string(), |id| id.to_string());

        let media = record
            .local_media_file
            .as_ref()
            .map_or_else(|| "-".to_string(), |m| m.local_path.clone());

        table.add_row(vec![
            id,
            record.date().unwrap_or("-").to_string(),
            media,
            truncate(record.text(), 40),
        ]);
    }

    table.to_string()
}

/// Formats captured records as pretty JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_records_json(records: &[CapturedRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// Formats the groups and threads found in the backup tree.
pub fn format_groups(groups: &[GroupListing]) -> String {
    if groups.is_empty() {
        return format!("{} No backup groups found", "⚠".yellow());
    }

    let mut out = format!("{}\n", "📂 Available groups".bold());
    for group in groups {
        let dump = if group.has_dump {
            "dump".green()
        } else {
            "threads only".blue()
        };
        out.push_str(&format!("  - Group {} [{}]\n", group.name.cyan(), dump));

        if !group.threads.is_empty() {
            let threads: Vec<String> = group.threads.iter().map(ToString::to_string).collect();
            out.push_str(&format!("    Threads: {}\n", threads.join(", ")));
        }
    }

    out
}

/// One-line report of a finished pass.
pub fn format_pass_report(scope: &ExportScope, report: &PassReport) -> String {
    let label = if scope.thread_id == 0 {
        format!("group {}", scope.group_id)
    } else {
        format!("thread {}", scope.thread_id)
    };

    let status = match &report.outcome {
        PassOutcome::Exhausted => "no more events".green(),
        PassOutcome::LowerBoundReached => "lower id bound reached".green(),
        PassOutcome::Aborted(reason) => format!("aborted: {reason}").red(),
    };

    format!(
        "{} {}: {} captured, {} media saved, {} media failed, {} records in dump ({})",
        if report.outcome.is_failure() {
            "✗".red().bold()
        } else {
            "✓".green().bold()
        },
        label.cyan(),
        report.captured,
        report.media_saved,
        report.media_failed,
        report.total_records,
        status
    )
}

/// Formats the final run summary.
pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "{}\n  Threads processed: {}\n  Threads failed: {}\n  Messages captured: {}\n  Media saved: {}",
        "📊 Summary".bold(),
        summary.threads_processed.to_string().cyan(),
        if summary.threads_failed == 0 {
            "0".green()
        } else {
            summary.threads_failed.to_string().red()
        },
        summary.records_captured.to_string().cyan(),
        summary.media_saved.to_string().yellow()
    )
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{cut}...")
    }
}
