//! Git-backed version control for docloop feedback sessions
//!
//! Each session works on its own `<tracking_branch>/<session_id>` branch:
//! the baseline and every edited copy are committed there, and completing
//! the session merges the branch back into the main branch.

mod error;
mod vcs;

pub use error::GitError;
pub use vcs::GitVcs;
