//! Applies confident suggestions to the structured configuration stores.
//!
//! Only suggestions strictly above the threshold reach a writer. Everything
//! else is reported as skipped, and a failing writer is reported as failed
//! without stopping the rest of the batch.

mod structured;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::types::suggestion::{Suggestion, SuggestionSet, UpdateTarget};

pub use structured::{
    ContextStoreWriter, FileWriterProvider, ProgramConfigWriter, StructuredFile, StructuredFormat,
};

/// Failure of a single store write
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported store format: {0}")]
    UnsupportedFormat(String),

    #[error("field '{field}' exists but is not a list")]
    NotAList { field: String },

    #[error("store root is not a mapping")]
    NotAMapping,

    #[error("rejected: {0}")]
    Rejected(String),
}

/// Merges one suggestion into a structured store
pub trait StoreWriter {
    fn write(&self, suggestion: &Suggestion) -> Result<(), WriterError>;
}

/// Writers for both destinations of a suggestion set
pub struct StoreWriters {
    pub context: Box<dyn StoreWriter>,
    pub program: Box<dyn StoreWriter>,
}

impl StoreWriters {
    fn for_target(&self, target: UpdateTarget) -> &dyn StoreWriter {
        match target {
            UpdateTarget::Context => self.context.as_ref(),
            UpdateTarget::Program => self.program.as_ref(),
        }
    }
}

/// Builds the writers for a session's program and customer
pub trait WriterProvider {
    fn writers(&self, program_type: &str, customer_name: &str) -> StoreWriters;
}

/// Outcome for one suggestion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApplyStatus {
    Applied,
    /// At or below the threshold; left for manual review
    Skipped,
    Failed { error: String },
}

/// One line of the apply summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedEntry {
    pub target: UpdateTarget,
    pub section: String,
    pub confidence: f64,
    #[serde(flatten)]
    pub status: ApplyStatus,
}

/// Per-suggestion results of an apply run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppliedSummary {
    pub threshold: f64,
    pub entries: Vec<AppliedEntry>,
}

impl AppliedSummary {
    pub fn applied(&self) -> usize {
        self.count(|s| matches!(s, ApplyStatus::Applied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ApplyStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ApplyStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ApplyStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }
}

/// Dispatches suggestions above a confidence threshold to store writers
#[derive(Debug, Clone, Copy)]
pub struct ApplyEngine {
    threshold: f64,
}

impl Default for ApplyEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl ApplyEngine {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn apply(&self, suggestions: &SuggestionSet, writers: &StoreWriters) -> AppliedSummary {
        let mut summary = AppliedSummary {
            threshold: self.threshold,
            entries: Vec::with_capacity(suggestions.len()),
        };

        for (target, suggestion) in suggestions.iter() {
            let status = if suggestion.confidence > self.threshold {
                match writers.for_target(target).write(suggestion) {
                    Ok(()) => {
                        debug!(
                            store = target.as_str(),
                            section = %suggestion.section,
                            "applied suggestion"
                        );
                        ApplyStatus::Applied
                    }
                    Err(e) => {
                        warn!(
                            store = target.as_str(),
                            section = %suggestion.section,
                            error = %e,
                            "store writer failed"
                        );
                        ApplyStatus::Failed { error: e.to_string() }
                    }
                }
            } else {
                ApplyStatus::Skipped
            };

            summary.entries.push(AppliedEntry {
                target,
                section: suggestion.section.clone(),
                confidence: suggestion.confidence,
                status,
            });
        }

        info!(
            applied = summary.applied(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            threshold = self.threshold,
            "applied feedback suggestions"
        );
        summary
    }
}
