use std::path::PathBuf;

use libdocloop_core::AdvisoryError;
use thiserror::Error;

/// Errors that can occur during Git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a git repository")]
    NotARepo,

    #[error("Repository has no working directory")]
    BareRepository,

    #[error("Path is outside the repository: {0}")]
    OutsideWorkdir(PathBuf),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Merging {branch} into {into} produced conflicts")]
    MergeConflict { branch: String, into: String },
}

impl GitError {
    /// Wrap as the advisory error reported to the session manager
    pub fn into_advisory(self, operation: &'static str) -> AdvisoryError {
        match self {
            GitError::NotARepo | GitError::BareRepository => {
                AdvisoryError::Unavailable(self.to_string())
            }
            other => AdvisoryError::failed(operation, other),
        }
    }
}

impl From<GitError> for AdvisoryError {
    fn from(e: GitError) -> Self {
        e.into_advisory("git")
    }
}
