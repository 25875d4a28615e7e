//! Advisory version control.
//!
//! Branching and commits around feedback sessions are a convenience. Every
//! operation returns `AdvisoryError` on failure and callers route the result
//! through [`advisory`], which logs and discards it, so a broken repository
//! can never fail analysis or session bookkeeping.

use std::path::Path;

use thiserror::Error;
use tracing::warn;

/// Failure of an advisory version-control operation
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("version control unavailable: {0}")]
    Unavailable(String),

    #[error("{operation} failed: {message}")]
    Failed {
        operation: &'static str,
        message: String,
    },
}

impl AdvisoryError {
    pub fn failed(operation: &'static str, message: impl ToString) -> Self {
        AdvisoryError::Failed {
            operation,
            message: message.to_string(),
        }
    }
}

/// Operations the session manager needs from a version-control system
pub trait VersionControl {
    /// Check out `name`, creating it from the current HEAD if needed
    fn checkout_branch(&self, name: &str) -> Result<(), AdvisoryError>;

    /// Stage files
    fn add(&self, paths: &[&Path]) -> Result<(), AdvisoryError>;

    /// Commit the staged changes on the current branch
    fn commit(&self, message: &str) -> Result<(), AdvisoryError>;

    /// Merge `branch` into `into` and leave `into` checked out
    fn merge(&self, branch: &str, into: &str) -> Result<(), AdvisoryError>;
}

/// Log and swallow the outcome of an advisory operation
pub fn advisory<T>(operation: &str, result: Result<T, AdvisoryError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(operation, error = %e, "advisory version control step failed; continuing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_swallows_errors() {
        let result: Result<(), AdvisoryError> = Err(AdvisoryError::failed("commit", "no HEAD"));
        assert!(advisory("commit", result).is_none());
        assert_eq!(advisory("branch", Ok::<_, AdvisoryError>(3)), Some(3));
    }

    #[test]
    fn test_error_message() {
        let err = AdvisoryError::failed("merge", "conflicts in solution.md");
        assert_eq!(err.to_string(), "merge failed: conflicts in solution.md");
    }
}
