use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change::{ChangeKind, ChangeRecord};
use super::suggestion::SuggestionSet;

/// Result of analysing one edited copy against its baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub report_id: String,
    pub document_path: String,
    pub baseline_version_id: String,
    pub updated_content_hash: String,
    pub timestamp: DateTime<Utc>,
    pub changes: Vec<ChangeRecord>,
    pub suggestions: SuggestionSet,
}

/// Counts over a report's changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub total: usize,
    pub additions: usize,
    pub deletions: usize,
    pub modifications: usize,
    pub sections: usize,
}

impl FeedbackReport {
    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary {
            total: self.changes.len(),
            ..Default::default()
        };
        let mut sections = BTreeSet::new();
        for change in &self.changes {
            match change.kind {
                ChangeKind::Addition => summary.additions += 1,
                ChangeKind::Deletion => summary.deletions += 1,
                ChangeKind::Modification => summary.modifications += 1,
            }
            sections.insert(change.section.as_str());
        }
        summary.sections = sections.len();
        summary
    }
}
