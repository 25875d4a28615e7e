use std::path::Path;

use libdocloop_core::report::render_session_summary;
use libdocloop_core::session::RegenerationOutcome;
use libdocloop_core::{
    ApplyStatus, DocloopError, FeedbackSession, ProcessOptions, SessionFilter, SessionStatus,
};
use serde::Serialize;

use super::{short_time, table};
use crate::cli::{Cli, SessionCommand};
use crate::context::DocloopContext;
use crate::output::{emit, note};

#[derive(Serialize)]
struct SessionStartOutput {
    session_id: String,
    document_path: String,
    original_version_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
}

#[derive(Serialize)]
struct SessionStateOutput {
    session_id: String,
    status: SessionStatus,
    iterations: u32,
}

#[derive(Serialize)]
struct SessionListOutput {
    sessions: Vec<SessionSummaryJson>,
    total: usize,
}

#[derive(Serialize)]
struct SessionSummaryJson {
    session_id: String,
    document_path: String,
    program_type: String,
    customer_name: String,
    status: SessionStatus,
    iterations: u32,
    last_update: String,
}

impl From<&FeedbackSession> for SessionSummaryJson {
    fn from(s: &FeedbackSession) -> Self {
        Self {
            session_id: s.session_id.clone(),
            document_path: s.document_path.clone(),
            program_type: s.program_type.clone(),
            customer_name: s.customer_name.clone(),
            status: s.status,
            iterations: s.iterations,
            last_update: s.last_update.to_rfc3339(),
        }
    }
}

pub fn run(cli: &Cli, cmd: SessionCommand) -> Result<(), DocloopError> {
    match cmd {
        SessionCommand::Start { document, program, customer } => {
            run_start(cli, &document, &program, &customer)
        }
        SessionCommand::Process { id, edited, apply, regenerate } => run_process(
            cli,
            &id,
            &edited,
            ProcessOptions {
                auto_apply: apply,
                regenerate,
            },
        ),
        SessionCommand::Complete { id } => run_complete(cli, &id),
        SessionCommand::Abandon { id, reason } => run_abandon(cli, &id, reason.as_deref()),
        SessionCommand::List { status, document } => run_list(cli, status, document.as_deref()),
        SessionCommand::Show { id } => run_show(cli, &id),
    }
}

fn run_start(
    cli: &Cli,
    document: &Path,
    program: &str,
    customer: &str,
) -> Result<(), DocloopError> {
    let ctx = DocloopContext::resolve(cli)?;
    let manager = ctx.session_manager()?;

    if let Some(active) = manager.find_active(document)? {
        return Err(DocloopError::Conflict(format!(
            "session {} is already active for {}",
            active.session_id,
            document.display()
        )));
    }

    let session_id = manager.start(document, program, customer)?;
    let session = manager.get(&session_id)?;

    note(
        cli,
        &format!(
            "Started session {} for {} (baseline {})",
            session.session_id,
            document.display(),
            session.original_version_id
        ),
    );
    if let Some(branch) = &session.branch {
        note(cli, &format!("Working on branch {}", branch));
    }

    emit(
        cli,
        SessionStartOutput {
            session_id: session.session_id,
            document_path: session.document_path,
            original_version_id: session.original_version_id,
            branch: session.branch,
        },
    )
}

fn run_process(
    cli: &Cli,
    id: &str,
    edited: &Path,
    options: ProcessOptions,
) -> Result<(), DocloopError> {
    let ctx = DocloopContext::resolve(cli)?;
    let manager = ctx.session_manager()?;
    let outcome = manager.process(id, edited, options)?;

    if !cli.json && !cli.quiet {
        let summary = outcome.report.summary();
        let mut lines = vec![format!(
            "Iteration {}: {} change(s) (+{} -{}) across {} section(s)",
            outcome.iterations,
            summary.total,
            summary.additions,
            summary.deletions,
            summary.sections
        )];

        if outcome.report.suggestions.is_empty() {
            lines.push("No suggested updates.".to_string());
        }
        for (target, suggestion) in outcome.report.suggestions.iter() {
            lines.push(format!(
                "  {} / {} ({}%)",
                target.as_str(),
                suggestion.section,
                suggestion.confidence_percent()
            ));
        }

        if outcome.approval_required {
            lines.push("Approval required: suggestions were not applied.".to_string());
        }
        if let Some(applied) = &outcome.applied {
            lines.push(format!(
                "Applied {}, skipped {}, failed {} (threshold {})",
                applied.applied(),
                applied.skipped(),
                applied.failed(),
                applied.threshold
            ));
            for entry in &applied.entries {
                if let ApplyStatus::Failed { error } = &entry.status {
                    lines.push(format!("  failed {}: {}", entry.section, error));
                }
            }
        }
        match &outcome.regeneration {
            Some(RegenerationOutcome::Tracked { path, version_id }) => lines.push(format!(
                "Regenerated {} as {}",
                path.display(),
                version_id
            )),
            Some(RegenerationOutcome::Failed { error }) => {
                lines.push(format!("Regeneration failed: {}", error))
            }
            None => {}
        }
        note(cli, &lines.join("\n"));
    }

    emit(cli, outcome)
}

fn run_complete(cli: &Cli, id: &str) -> Result<(), DocloopError> {
    let ctx = DocloopContext::resolve(cli)?;
    let session = ctx.session_manager()?.complete(id)?;

    note(
        cli,
        &format!(
            "Completed session {} after {} iteration(s)",
            session.session_id, session.iterations
        ),
    );
    emit(cli, state_output(&session))
}

fn run_abandon(cli: &Cli, id: &str, reason: Option<&str>) -> Result<(), DocloopError> {
    let ctx = DocloopContext::resolve(cli)?;
    let session = ctx.session_manager()?.abandon(id, reason)?;

    note(cli, &format!("Abandoned session {}", session.session_id));
    emit(cli, state_output(&session))
}

fn state_output(session: &FeedbackSession) -> SessionStateOutput {
    SessionStateOutput {
        session_id: session.session_id.clone(),
        status: session.status,
        iterations: session.iterations,
    }
}

fn run_list(
    cli: &Cli,
    status: Option<String>,
    document: Option<&Path>,
) -> Result<(), DocloopError> {
    let status = status
        .map(|s| {
            SessionStatus::from_str(&s.to_lowercase()).ok_or_else(|| {
                DocloopError::InvalidArgs(format!(
                    "unknown status '{}' (expected active, completed or abandoned)",
                    s
                ))
            })
        })
        .transpose()?;

    let ctx = DocloopContext::resolve(cli)?;
    let manager = ctx.session_manager()?;
    let filter = SessionFilter {
        status,
        document_path: document.map(Path::to_path_buf),
    };
    let sessions = manager.list(&filter)?;

    if !cli.json && !cli.quiet {
        if sessions.is_empty() {
            note(cli, "No sessions.");
        } else {
            let mut t = table(vec![
                "Session", "Status", "Program", "Customer", "Iterations", "Updated", "Document",
            ]);
            for s in &sessions {
                t.add_row(vec![
                    s.session_id.clone(),
                    s.status.to_string(),
                    s.program_type.clone(),
                    s.customer_name.clone(),
                    s.iterations.to_string(),
                    short_time(&s.last_update),
                    s.document_path.clone(),
                ]);
            }
            note(cli, &t.to_string());
        }
    }

    let summaries: Vec<SessionSummaryJson> =
        sessions.iter().map(SessionSummaryJson::from).collect();
    let total = summaries.len();
    emit(cli, SessionListOutput { sessions: summaries, total })
}

fn run_show(cli: &Cli, id: &str) -> Result<(), DocloopError> {
    let ctx = DocloopContext::resolve(cli)?;
    let session = ctx.session_manager()?.get(id)?;

    note(cli, render_session_summary(&session).trim_end());
    emit(cli, session)
}
