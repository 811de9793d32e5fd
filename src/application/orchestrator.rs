//! Run orchestration across threads.
//!
//! Threads are exported one after another; a failed thread is reported and
//! the run moves on to the next one.

use std::path::Path;

use crate::domain::{AuditLogSource, ExportScope, PassReport, Result, RunSummary};
use crate::infrastructure::prepare_scope_dir;

use super::exporter::{ExportPass, PassOptions};

/// Exports every scope in order under `backup_root`.
///
/// `on_pass` is called after each thread with its report or error.
pub async fn run_export<S, F>(
    source: &S,
    scopes: &[ExportScope],
    backup_root: &Path,
    options: PassOptions,
    mut on_pass: F,
) -> RunSummary
where
    S: AuditLogSource + ?Sized,
    F: FnMut(&ExportScope, &Result<PassReport>),
{
    let mut summary = RunSummary::default();

    for (index, scope) in scopes.iter().enumerate() {
        tracing::info!(
            group = scope.group_id,
            thread = scope.thread_id,
            mode = %scope.mode,
            "Exporting thread {}/{}",
            index + 1,
            scopes.len()
        );

        let result = run_scope(source, scope, backup_root, options).await;

        summary.threads_processed += 1;
        match &result {
            Ok(report) => {
                summary.records_captured += report.captured;
                summary.media_saved += report.media_saved;
                if report.outcome.is_failure() {
                    summary.threads_failed += 1;
                }
            }
            Err(e) => {
                summary.threads_failed += 1;
                tracing::error!(thread = scope.thread_id, error = %e, "Thread export failed");
            }
        }

        on_pass(scope, &result);
    }

    tracing::info!(
        threads = summary.threads_processed,
        failed = summary.threads_failed,
        records = summary.records_captured,
        "Export run finished"
    );

    summary
}

async fn run_scope<S>(
    source: &S,
    scope: &ExportScope,
    backup_root: &Path,
    options: PassOptions,
) -> Result<PassReport>
where
    S: AuditLogSource + ?Sized,
{
    let scope_dir = prepare_scope_dir(backup_root, scope).await?;
    ExportPass::new(source, *scope, scope_dir, options).run().await
}
