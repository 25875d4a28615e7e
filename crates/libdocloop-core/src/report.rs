//! Feedback reports: building them from a baseline and an edited copy, and
//! rendering them as Markdown.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::diff::DiffEngine;
use crate::error::DocloopError;
use crate::hash::content_hash;
use crate::store::{ReportStore, VersionStore};
use crate::suggest::SuggestionGenerator;
use crate::types::change::ChangeKind;
use crate::types::ids::generate_report_id;
use crate::types::report::FeedbackReport;
use crate::types::session::FeedbackSession;
use crate::types::suggestion::{SuggestedUpdate, Suggestion};
use crate::types::version::VersionRecord;

/// Diff `edited` against a baseline record and derive suggestions
pub fn build_report(
    engine: &DiffEngine,
    baseline: &VersionRecord,
    edited: &str,
) -> FeedbackReport {
    let changes = engine.diff(&baseline.content, edited);
    let suggestions = SuggestionGenerator::new().suggest(&changes);
    let now = Utc::now();

    FeedbackReport {
        report_id: generate_report_id(&now),
        document_path: baseline.file_path.clone(),
        baseline_version_id: baseline.version_id.clone(),
        updated_content_hash: content_hash(edited),
        timestamp: now,
        changes,
        suggestions,
    }
}

/// Analyse an edited document against its latest tracked baseline and keep
/// the report for audit
pub fn analyze(
    versions: &VersionStore,
    reports: &ReportStore,
    engine: &DiffEngine,
    edited_path: &Path,
) -> Result<FeedbackReport, DocloopError> {
    let baseline = versions.latest(edited_path)?;
    let edited = std::fs::read_to_string(edited_path)?;
    let report = build_report(engine, &baseline, &edited);
    reports.save(&report)?;
    Ok(report)
}

/// Analyse an edited document and write the Markdown report into `out_dir`.
///
/// Returns the report together with the path it was written to.
pub fn generate_diff_report(
    versions: &VersionStore,
    reports: &ReportStore,
    engine: &DiffEngine,
    edited_path: &Path,
    out_dir: &Path,
) -> Result<(FeedbackReport, PathBuf), DocloopError> {
    let report = analyze(versions, reports, engine, edited_path)?;
    let path = write_markdown(&report, out_dir)?;
    Ok((report, path))
}

/// Write `<report_id>.md` into `out_dir`
pub fn write_markdown(report: &FeedbackReport, out_dir: &Path) -> Result<PathBuf, DocloopError> {
    std::fs::create_dir_all(out_dir)?;
    let report_path = out_dir.join(format!("{}.md", report.report_id));
    std::fs::write(&report_path, render_markdown(report))?;
    info!(path = %report_path.display(), changes = report.changes.len(), "wrote diff report");
    Ok(report_path)
}

/// Render a report as Markdown
pub fn render_markdown(report: &FeedbackReport) -> String {
    let mut md = String::new();
    let summary = report.summary();

    md.push_str("# Feedback Analysis Report\n\n");
    md.push_str(&format!("**Document:** `{}`\n\n", report.document_path));
    md.push_str(&format!("**Baseline Version:** `{}`\n\n", report.baseline_version_id));
    md.push_str(&format!("**Generated:** {}\n\n", report.timestamp.to_rfc3339()));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Total changes: {}\n", summary.total));
    md.push_str(&format!("- Additions: {}\n", summary.additions));
    md.push_str(&format!("- Deletions: {}\n", summary.deletions));
    md.push_str(&format!("- Modifications: {}\n", summary.modifications));
    md.push_str(&format!("- Sections affected: {}\n\n", summary.sections));

    md.push_str("## Changes by Section\n\n");
    if report.changes.is_empty() {
        md.push_str("No changes detected.\n\n");
    } else {
        let mut seen: Vec<&str> = Vec::new();
        for change in &report.changes {
            if !seen.contains(&change.section.as_str()) {
                seen.push(&change.section);
            }
        }
        for section in seen {
            md.push_str(&format!("### {}\n\n", section));
            md.push_str("```diff\n");
            for change in report.changes.iter().filter(|c| c.section == section) {
                let marker = match change.kind {
                    ChangeKind::Addition => '+',
                    ChangeKind::Deletion => '-',
                    ChangeKind::Modification => '~',
                };
                md.push_str(&format!("{} {}\n", marker, change.text()));
            }
            md.push_str("```\n\n");
        }
    }

    md.push_str("## Suggested Updates\n\n");
    if report.suggestions.is_empty() {
        md.push_str("No suggested updates.\n");
        return md;
    }
    if !report.suggestions.context_updates.is_empty() {
        md.push_str("### Customer Context\n\n");
        for s in &report.suggestions.context_updates {
            render_suggestion(&mut md, s);
        }
        md.push('\n');
    }
    if !report.suggestions.program_updates.is_empty() {
        md.push_str("### Program Configuration\n\n");
        for s in &report.suggestions.program_updates {
            render_suggestion(&mut md, s);
        }
        md.push('\n');
    }

    md
}

fn render_suggestion(md: &mut String, suggestion: &Suggestion) {
    let detail = match &suggestion.suggested_update {
        SuggestedUpdate::Generic { additions, deletions, net_change } => format!(
            "{} added, {} removed, net {:+}",
            additions.len(),
            deletions.len(),
            net_change
        ),
        SuggestedUpdate::Workflow { modified_steps } => {
            format!("{} workflow step(s) modified", modified_steps.len())
        }
    };
    md.push_str(&format!(
        "- **{}** (confidence: {}%): {}\n",
        suggestion.section,
        suggestion.confidence_percent(),
        detail
    ));
}

/// Render an overview of a session and each of its iterations
pub fn render_session_summary(session: &FeedbackSession) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Feedback Session {}\n\n", session.session_id));
    md.push_str(&format!("- Document: `{}`\n", session.document_path));
    md.push_str(&format!("- Program: {}\n", session.program_type));
    md.push_str(&format!("- Customer: {}\n", session.customer_name));
    md.push_str(&format!("- Status: {}\n", session.status));
    md.push_str(&format!("- Baseline: `{}`\n", session.original_version_id));
    md.push_str(&format!("- Iterations: {}\n", session.iterations));
    md.push_str(&format!("- Started: {}\n", session.start_time.to_rfc3339()));
    md.push_str(&format!("- Last update: {}\n", session.last_update.to_rfc3339()));
    if let Some(branch) = &session.branch {
        md.push_str(&format!("- Branch: `{}`\n", branch));
    }
    if let Some(reason) = &session.abandon_reason {
        md.push_str(&format!("- Abandoned: {}\n", reason));
    }
    md.push('\n');

    if session.changes.is_empty() {
        md.push_str("No feedback processed yet.\n");
        return md;
    }

    for (i, report) in session.changes.iter().enumerate() {
        let summary = report.summary();
        md.push_str(&format!("## Iteration {}\n\n", i + 1));
        md.push_str(&format!(
            "{} change(s) across {} section(s): +{} -{}; {} suggestion(s)\n\n",
            summary.total,
            summary.sections,
            summary.additions,
            summary.deletions,
            report.suggestions.len()
        ));
        for (target, s) in report.suggestions.iter() {
            md.push_str(&format!(
                "- {} / {} ({}%)\n",
                target.as_str(),
                s.section,
                s.confidence_percent()
            ));
        }
        md.push('\n');
    }

    md
}
