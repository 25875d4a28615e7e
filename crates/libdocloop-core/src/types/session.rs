use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::report::FeedbackReport;
use crate::error::DocloopError;

/// Life-cycle state of a feedback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            "abandoned" => Some(SessionStatus::Abandoned),
            _ => None,
        }
    }

    /// Completed and abandoned sessions admit no further transition
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One customer's iterative feedback cycle over a single document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSession {
    pub session_id: String,
    pub document_path: String,
    pub program_type: String,
    pub customer_name: String,
    pub original_version_id: String,
    /// Equal to `changes.len()` after every process call
    pub iterations: u32,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    /// Reports in process-call order (append-only)
    pub changes: Vec<FeedbackReport>,
    /// Tracking branch, when version control is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abandon_reason: Option<String>,
}

impl FeedbackSession {
    /// Fail with `InvalidState` unless the session can still change
    pub fn ensure_active(&self, operation: &'static str) -> Result<(), DocloopError> {
        if self.status.is_terminal() {
            return Err(DocloopError::InvalidState {
                session_id: self.session_id.clone(),
                status: self.status,
                operation,
            });
        }
        Ok(())
    }

    /// Append a report and keep the iteration counter in step
    pub fn record(&mut self, report: FeedbackReport) {
        self.last_update = report.timestamp;
        self.changes.push(report);
        self.iterations = self.changes.len() as u32;
    }

    pub fn latest_report(&self) -> Option<&FeedbackReport> {
        self.changes.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::suggestion::SuggestionSet;

    fn session() -> FeedbackSession {
        let now = Utc::now();
        FeedbackSession {
            session_id: "session_1".to_string(),
            document_path: "/docs/solution.md".to_string(),
            program_type: "onboarding".to_string(),
            customer_name: "Acme".to_string(),
            original_version_id: "v_1_abcdef01".to_string(),
            iterations: 0,
            status: SessionStatus::Active,
            start_time: now,
            last_update: now,
            changes: vec![],
            branch: None,
            abandon_reason: None,
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [SessionStatus::Active, SessionStatus::Completed, SessionStatus::Abandoned] {
            assert_eq!(SessionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::from_str("paused"), None);
    }

    #[test]
    fn test_record_keeps_iterations_in_step() {
        let mut s = session();
        for i in 0..3 {
            s.record(FeedbackReport {
                report_id: format!("report_{}", i),
                document_path: s.document_path.clone(),
                baseline_version_id: s.original_version_id.clone(),
                updated_content_hash: String::new(),
                timestamp: Utc::now(),
                changes: vec![],
                suggestions: SuggestionSet::default(),
            });
            assert_eq!(s.iterations as usize, s.changes.len());
        }
        assert_eq!(s.latest_report().unwrap().report_id, "report_2");
    }

    #[test]
    fn test_terminal_sessions_reject_operations() {
        let mut s = session();
        assert!(s.ensure_active("process").is_ok());
        s.status = SessionStatus::Abandoned;
        let err = s.ensure_active("process").unwrap_err();
        assert!(matches!(err, DocloopError::InvalidState { status: SessionStatus::Abandoned, .. }));
    }
}
