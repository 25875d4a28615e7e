//! Feedback sessions: a document's baseline, the edited copies processed
//! against it, and what was done with the resulting suggestions.
//!
//! ```text
//! start ──► active ──process──► active ──complete──► completed
//!              └──────────────abandon──────────────► abandoned
//! ```
//!
//! Version control around a session is advisory: failures are logged and the
//! session carries on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::apply::{AppliedSummary, ApplyEngine, WriterProvider};
use crate::backend::StorageBackend;
use crate::config::Config;
use crate::diff::{DiffEngine, LineClassifier};
use crate::error::DocloopError;
use crate::regenerate::{DocumentGenerator, RegenerationTrigger};
use crate::report;
use crate::store::{document_key, ReportStore, SessionStore, VersionStore};
use crate::types::ids::generate_session_id;
use crate::types::report::FeedbackReport;
use crate::types::session::{FeedbackSession, SessionStatus};
use crate::types::version::Metadata;
use crate::vcs::{advisory, AdvisoryError, VersionControl};

/// What `process` should do beyond recording the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    pub auto_apply: bool,
    pub regenerate: bool,
}

/// Result of regenerating the document after an apply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RegenerationOutcome {
    Tracked { path: PathBuf, version_id: String },
    Failed { error: String },
}

/// Everything one `process` call produced
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub session_id: String,
    pub iterations: u32,
    pub report: FeedbackReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<AppliedSummary>,
    /// Auto-apply was requested but the workspace requires manual approval
    pub approval_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regeneration: Option<RegenerationOutcome>,
}

/// Criteria for `SessionManager::list`
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub status: Option<SessionStatus>,
    pub document_path: Option<PathBuf>,
}

impl SessionFilter {
    pub fn status(status: SessionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn document(path: &Path) -> Self {
        Self {
            document_path: Some(path.to_path_buf()),
            ..Default::default()
        }
    }
}

/// Runs the session life cycle over the version, session and report stores
pub struct SessionManager {
    versions: VersionStore,
    sessions: SessionStore,
    reports: ReportStore,
    config: Config,
    engine: DiffEngine,
    vcs: Option<Box<dyn VersionControl>>,
    writers: Option<Box<dyn WriterProvider>>,
    generator: Option<Box<dyn DocumentGenerator>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("vcs", &self.vcs.is_some())
            .field("writers", &self.writers.is_some())
            .field("generator", &self.generator.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(backend: Arc<dyn StorageBackend>, config: Config) -> Self {
        Self {
            versions: VersionStore::new(backend.clone()),
            sessions: SessionStore::new(backend.clone()),
            reports: ReportStore::new(backend),
            config,
            engine: DiffEngine::new(),
            vcs: None,
            writers: None,
            generator: None,
        }
    }

    pub fn with_vcs(mut self, vcs: Box<dyn VersionControl>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    pub fn with_writers(mut self, writers: Box<dyn WriterProvider>) -> Self {
        self.writers = Some(writers);
        self
    }

    pub fn with_generator(mut self, generator: Box<dyn DocumentGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn LineClassifier>) -> Self {
        self.engine = DiffEngine::with_classifier(classifier);
        self
    }

    pub fn versions(&self) -> &VersionStore {
        &self.versions
    }

    /// Record a document version outside of any session
    pub fn track(&self, file_path: &Path, metadata: Metadata) -> Result<String, DocloopError> {
        self.versions.track(file_path, metadata)
    }

    /// Analyse an edited document against its latest baseline and write a
    /// Markdown report into `out_dir`
    pub fn generate_diff_report(
        &self,
        edited_path: &Path,
        out_dir: &Path,
    ) -> Result<(FeedbackReport, PathBuf), DocloopError> {
        report::generate_diff_report(
            &self.versions,
            &self.reports,
            &self.engine,
            edited_path,
            out_dir,
        )
    }

    /// Track the document as the session's baseline and open the session
    pub fn start(
        &self,
        document_path: &Path,
        program_type: &str,
        customer_name: &str,
    ) -> Result<String, DocloopError> {
        if program_type.trim().is_empty() || customer_name.trim().is_empty() {
            return Err(DocloopError::InvalidArgs(
                "program type and customer name must not be empty".to_string(),
            ));
        }

        let mut metadata = Metadata::new();
        metadata.insert("program_type".to_string(), program_type.to_string());
        metadata.insert("customer_name".to_string(), customer_name.to_string());
        metadata.insert("source".to_string(), "session".to_string());
        let version_id = self.versions.track(document_path, metadata)?;

        let now = Utc::now();
        let mut session = FeedbackSession {
            session_id: generate_session_id(&now),
            document_path: document_key(document_path),
            program_type: program_type.to_string(),
            customer_name: customer_name.to_string(),
            original_version_id: version_id,
            iterations: 0,
            status: SessionStatus::Active,
            start_time: now,
            last_update: now,
            changes: Vec::new(),
            branch: None,
            abandon_reason: None,
        };
        self.sessions.save(&session)?;
        info!(
            session_id = %session.session_id,
            document = %session.document_path,
            baseline = %session.original_version_id,
            "started feedback session"
        );

        if let Some(vcs) = &self.vcs {
            let branch = self.config.vcs.session_branch(&session.session_id);
            // Recorded as soon as HEAD is on the branch
            if advisory("checkout session branch", vcs.checkout_branch(&branch)).is_some() {
                session.branch = Some(branch);
                self.sessions.save(&session)?;

                let message = format!(
                    "Track {} for feedback session {}",
                    session.document_path, session.session_id
                );
                advisory(
                    "commit session baseline",
                    commit_files(vcs.as_ref(), &[document_path], &message),
                );
            }
        }

        Ok(session.session_id)
    }

    /// Diff an edited copy against the session baseline and record the report
    pub fn process(
        &self,
        session_id: &str,
        edited_path: &Path,
        options: ProcessOptions,
    ) -> Result<ProcessOutcome, DocloopError> {
        let mut session = self.sessions.load(session_id)?;
        session.ensure_active("process feedback")?;

        let approval_required = options.auto_apply && self.config.feedback.require_approval;
        let apply = options.auto_apply && !approval_required;
        if apply && self.writers.is_none() {
            return Err(DocloopError::InvalidArgs(
                "auto-apply requested but no store writers are configured".to_string(),
            ));
        }
        if apply && options.regenerate && self.generator.is_none() {
            return Err(DocloopError::InvalidArgs(
                "regeneration requested but no generator is configured".to_string(),
            ));
        }

        let baseline = self.versions.get(&session.original_version_id)?;
        let edited = std::fs::read_to_string(edited_path)?;
        let report = report::build_report(&self.engine, &baseline, &edited);

        self.reports.save(&report)?;
        session.record(report.clone());
        self.sessions.save(&session)?;
        info!(
            session_id,
            iteration = session.iterations,
            changes = report.changes.len(),
            suggestions = report.suggestions.len(),
            "processed feedback"
        );

        if self.config.feedback.auto_commit {
            if let Some(vcs) = &self.vcs {
                let message = format!(
                    "Feedback iteration {} for session {}",
                    session.iterations, session.session_id
                );
                advisory(
                    "commit feedback",
                    commit_files(vcs.as_ref(), &[edited_path], &message),
                );
            }
        }

        if approval_required {
            info!(session_id, "suggestions held for manual approval");
        }

        let mut applied = None;
        let mut regeneration = None;
        if let Some(provider) = self.writers.as_deref().filter(|_| apply) {
            let writers = provider.writers(&session.program_type, &session.customer_name);
            let summary = ApplyEngine::new(self.config.feedback.confidence_threshold)
                .apply(&report.suggestions, &writers);

            if options.regenerate && summary.applied() > 0 {
                regeneration = self.regenerate(&session);
            } else if options.regenerate {
                debug!(session_id, "nothing applied; skipping regeneration");
            }
            applied = Some(summary);
        }

        Ok(ProcessOutcome {
            session_id: session.session_id,
            iterations: session.iterations,
            report,
            applied,
            approval_required,
            regeneration,
        })
    }

    fn regenerate(&self, session: &FeedbackSession) -> Option<RegenerationOutcome> {
        let generator = self.generator.as_deref()?;
        let trigger = RegenerationTrigger::new(generator, &self.versions);
        Some(
            match trigger.regenerate(&session.program_type, &session.customer_name) {
                Ok((path, version_id)) => RegenerationOutcome::Tracked { path, version_id },
                Err(e) => {
                    warn!(session_id = %session.session_id, error = %e, "regeneration failed");
                    RegenerationOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            },
        )
    }

    /// Close an active session and merge its branch into the main branch
    pub fn complete(&self, session_id: &str) -> Result<FeedbackSession, DocloopError> {
        let mut session = self.sessions.load(session_id)?;
        session.ensure_active("complete")?;

        session.status = SessionStatus::Completed;
        session.last_update = Utc::now();
        self.sessions.save(&session)?;
        info!(session_id, iterations = session.iterations, "completed feedback session");

        if let (Some(vcs), Some(branch)) = (&self.vcs, &session.branch) {
            advisory(
                "merge session branch",
                vcs.merge(branch, &self.config.vcs.main_branch),
            );
        }
        Ok(session)
    }

    /// Close an active session without merging anything
    pub fn abandon(
        &self,
        session_id: &str,
        reason: Option<&str>,
    ) -> Result<FeedbackSession, DocloopError> {
        let mut session = self.sessions.load(session_id)?;
        session.ensure_active("abandon")?;

        session.status = SessionStatus::Abandoned;
        session.abandon_reason = reason.map(str::to_string);
        session.last_update = Utc::now();
        self.sessions.save(&session)?;
        info!(session_id, reason = reason.unwrap_or(""), "abandoned feedback session");

        if let (Some(vcs), Some(_)) = (&self.vcs, &session.branch) {
            advisory(
                "leave session branch",
                vcs.checkout_branch(&self.config.vcs.main_branch),
            );
        }
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Result<FeedbackSession, DocloopError> {
        self.sessions.load(session_id)
    }

    /// Sessions matching `filter`, most recently updated first
    pub fn list(&self, filter: &SessionFilter) -> Result<Vec<FeedbackSession>, DocloopError> {
        let key = filter.document_path.as_deref().map(document_key);
        let mut sessions: Vec<FeedbackSession> = self
            .sessions
            .load_all()?
            .into_iter()
            .filter(|s| filter.status.map_or(true, |st| s.status == st))
            .filter(|s| key.as_ref().map_or(true, |k| &s.document_path == k))
            .collect();
        sessions.sort_by(|a, b| b.last_update.cmp(&a.last_update));
        Ok(sessions)
    }

    /// The active session for a document, if one exists
    pub fn find_active(
        &self,
        document_path: &Path,
    ) -> Result<Option<FeedbackSession>, DocloopError> {
        let filter = SessionFilter {
            status: Some(SessionStatus::Active),
            document_path: Some(document_path.to_path_buf()),
        };
        Ok(self.list(&filter)?.into_iter().next())
    }
}

fn commit_files(
    vcs: &dyn VersionControl,
    paths: &[&Path],
    message: &str,
) -> Result<(), AdvisoryError> {
    vcs.add(paths)?;
    vcs.commit(message)
}
