use std::path::Path;

use libdocloop_core::DocloopError;
use serde::Serialize;

use crate::cli::Cli;
use crate::context::DocloopContext;
use crate::output::{emit, note};

#[derive(Serialize)]
struct DiffOutput {
    report_id: String,
    report_path: String,
    baseline_version_id: String,
    changes: usize,
    context_updates: usize,
    program_updates: usize,
}

pub fn run(cli: &Cli, file: &Path, out: Option<&Path>) -> Result<(), DocloopError> {
    let ctx = DocloopContext::resolve(cli)?;
    let manager = ctx.session_manager()?;

    let out_dir = out.map(Path::to_path_buf).unwrap_or_else(|| ctx.reports_dir());
    let (report, report_path) = manager.generate_diff_report(file, &out_dir)?;

    let summary = report.summary();
    note(
        cli,
        &format!(
            "{} change(s) against {}: +{} -{} across {} section(s), {} suggestion(s)",
            summary.total,
            report.baseline_version_id,
            summary.additions,
            summary.deletions,
            summary.sections,
            report.suggestions.len()
        ),
    );
    note(cli, &format!("Report written to {}", report_path.display()));

    emit(
        cli,
        DiffOutput {
            report_id: report.report_id.clone(),
            report_path: report_path.to_string_lossy().to_string(),
            baseline_version_id: report.baseline_version_id.clone(),
            changes: report.changes.len(),
            context_updates: report.suggestions.context_updates.len(),
            program_updates: report.suggestions.program_updates.len(),
        },
    )
}
