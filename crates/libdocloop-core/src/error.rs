use thiserror::Error;

use crate::types::session::SessionStatus;

/// Main error type for docloop operations
#[derive(Debug, Error)]
pub enum DocloopError {
    #[error("not tracked: {0}")]
    NotTracked(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: session {session_id} is {status}, cannot {operation}")]
    InvalidState {
        session_id: String,
        status: SessionStatus,
        operation: &'static str,
    },

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("document generator failed: {0}")]
    Generator(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DocloopError {
    /// Get the error code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            DocloopError::NotTracked(_) => "not_tracked",
            DocloopError::NotFound(_) => "not_found",
            DocloopError::InvalidState { .. } => "invalid_state",
            DocloopError::InvalidArgs(_) => "invalid_args",
            DocloopError::Conflict(_) => "conflict",
            DocloopError::Io(_) => "io_error",
            DocloopError::Json(_) => "internal_error",
            DocloopError::Yaml(_) => "invalid_args",
            DocloopError::TomlParse(_) => "invalid_args",
            DocloopError::TomlSerialize(_) => "internal_error",
            DocloopError::Generator(_) => "generator_error",
            DocloopError::Internal(_) => "internal_error",
        }
    }

    /// Get the exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            DocloopError::InvalidArgs(_) => 2,
            DocloopError::TomlParse(_) => 2,
            DocloopError::NotTracked(_) => 3,
            DocloopError::NotFound(_) => 3,
            DocloopError::InvalidState { .. } => 4,
            DocloopError::Conflict(_) => 4,
            DocloopError::Io(_) => 5,
            DocloopError::Generator(_) => 6,
            _ => 1,
        }
    }

    /// Get actionable suggestions for fixing the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            DocloopError::NotTracked(_) => vec![
                "Run 'docloop track <file>' to record a baseline first",
            ],
            DocloopError::NotFound(msg) => {
                if msg.contains("session") || msg.starts_with("Session") {
                    vec!["Run 'docloop session list' to see available sessions"]
                } else if msg.contains("version") {
                    vec!["Run 'docloop versions <file>' to see tracked versions"]
                } else {
                    vec![]
                }
            }
            DocloopError::InvalidState { .. } => vec![
                "Completed and abandoned sessions are read-only",
                "Run 'docloop session start' to open a new session",
            ],
            DocloopError::Conflict(_) => vec![
                "Complete or abandon the active session for this document first",
            ],
            DocloopError::Generator(_) => vec![
                "Check the [generator] command in .docloop/config.toml",
            ],
            _ => vec![],
        }
    }

    /// Create a NotFound error for a session with helpful context
    pub fn session_not_found(session_id: &str) -> Self {
        DocloopError::NotFound(format!("Session '{}' not found", session_id))
    }

    /// Create a NotFound error for a version record
    pub fn version_not_found(version_id: &str) -> Self {
        DocloopError::NotFound(format!("version '{}' not found", version_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(DocloopError::NotTracked("a.md".into()).error_code(), "not_tracked");
        let err = DocloopError::InvalidState {
            session_id: "s1".into(),
            status: SessionStatus::Completed,
            operation: "process",
        };
        assert_eq!(err.error_code(), "invalid_state");
        assert_eq!(err.exit_code(), 4);
        assert_eq!(
            err.to_string(),
            "invalid state: session s1 is completed, cannot process"
        );
    }

    #[test]
    fn test_session_not_found_has_suggestion() {
        let err = DocloopError::session_not_found("session_1");
        assert_eq!(err.exit_code(), 3);
        assert!(!err.suggestions().is_empty());
    }
}
