use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{BranchType, Commit, Repository, ResetType, Signature};
use libdocloop_core::{AdvisoryError, VersionControl};
use tracing::{debug, info};

use crate::GitError;

const FALLBACK_NAME: &str = "docloop";
const FALLBACK_EMAIL: &str = "docloop@localhost";

/// Version control over a git working tree
pub struct GitVcs {
    repo: Repository,
    workdir: PathBuf,
}

impl std::fmt::Debug for GitVcs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitVcs")
            .field("workdir", &self.workdir)
            .finish_non_exhaustive()
    }
}

impl GitVcs {
    /// Open the repository whose working tree is `path`
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::open(path).map_err(|_| GitError::NotARepo)?;
        Self::from_repo(repo)
    }

    /// Find the repository containing `path`
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::discover(path).map_err(|_| GitError::NotARepo)?;
        Self::from_repo(repo)
    }

    fn from_repo(repo: Repository) -> Result<Self, GitError> {
        let workdir = repo.workdir().ok_or(GitError::BareRepository)?;
        let workdir = workdir.canonicalize()?;
        Ok(Self { repo, workdir })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Short name of the branch HEAD points at
    pub fn head_branch(&self) -> Result<String, GitError> {
        let head = self.repo.head()?;
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| GitError::BranchNotFound("HEAD".to_string()))
    }

    /// Point HEAD at `name`, creating the branch from HEAD when it is missing
    pub fn switch_branch(&self, name: &str) -> Result<(), GitError> {
        if self.repo.find_branch(name, BranchType::Local).is_err() {
            let head = self.head_commit()?;
            self.repo.branch(name, &head, false)?;
            info!(branch = name, "created branch");
        }
        self.repo.set_head(&branch_ref(name))?;
        self.repo.checkout_head(Some(CheckoutBuilder::new().safe()))?;
        debug!(branch = name, "checked out branch");
        Ok(())
    }

    /// Stage files, given absolute or working-directory-relative paths
    pub fn stage(&self, paths: &[&Path]) -> Result<(), GitError> {
        let mut index = self.repo.index()?;
        for path in paths {
            let relative = self.relative(path)?;
            index.add_path(&relative)?;
        }
        index.write()?;
        Ok(())
    }

    /// Commit the index on HEAD; returns `false` when nothing changed
    pub fn commit_index(&self, message: &str) -> Result<bool, GitError> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let parent = self.head_commit().ok();

        if parent.as_ref().is_some_and(|p| p.tree_id() == tree_id) {
            debug!("nothing to commit");
            return Ok(false);
        }

        let tree = self.repo.find_tree(tree_id)?;
        let sig = self.signature()?;
        let parents: Vec<&Commit> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        info!(commit = %oid, "committed");
        Ok(true)
    }

    /// Merge `branch` into `into`, fast-forwarding when possible.
    ///
    /// Leaves `into` checked out. Conflicts abort the merge and restore `into`.
    pub fn merge_branch(&self, branch: &str, into: &str) -> Result<(), GitError> {
        self.repo
            .find_branch(into, BranchType::Local)
            .map_err(|_| GitError::BranchNotFound(into.to_string()))?;
        let theirs = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| GitError::BranchNotFound(branch.to_string()))?
            .get()
            .peel_to_commit()?;

        self.switch_branch(into)?;

        let annotated = self.repo.find_annotated_commit(theirs.id())?;
        let (analysis, _) = self.repo.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            debug!(branch, into, "already up to date");
            return Ok(());
        }

        if analysis.is_fast_forward() {
            let mut reference = self.repo.find_reference(&branch_ref(into))?;
            reference.set_target(theirs.id(), &format!("docloop: fast-forward {}", branch))?;
            self.repo.set_head(&branch_ref(into))?;
            self.repo.checkout_head(Some(CheckoutBuilder::new().force()))?;
            info!(branch, into, "fast-forwarded");
            return Ok(());
        }

        self.repo.merge(&[&annotated], None, None)?;
        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            self.repo.cleanup_state()?;
            let head = self.head_commit()?;
            self.repo.reset(head.as_object(), ResetType::Hard, None)?;
            return Err(GitError::MergeConflict {
                branch: branch.to_string(),
                into: into.to_string(),
            });
        }

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let ours = self.head_commit()?;
        let sig = self.signature()?;
        let message = format!("Merge branch '{}' into {}", branch, into);
        self.repo
            .commit(Some("HEAD"), &sig, &sig, &message, &tree, &[&ours, &theirs])?;
        self.repo.cleanup_state()?;
        info!(branch, into, "merged");
        Ok(())
    }

    fn head_commit(&self) -> Result<Commit<'_>, GitError> {
        Ok(self.repo.head()?.peel_to_commit()?)
    }

    fn signature(&self) -> Result<Signature<'static>, GitError> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?),
        }
    }

    fn relative(&self, path: &Path) -> Result<PathBuf, GitError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        };
        let absolute = absolute.canonicalize()?;
        absolute
            .strip_prefix(&self.workdir)
            .map(Path::to_path_buf)
            .map_err(|_| GitError::OutsideWorkdir(absolute.clone()))
    }
}

impl VersionControl for GitVcs {
    fn checkout_branch(&self, name: &str) -> Result<(), AdvisoryError> {
        self.switch_branch(name).map_err(|e| e.into_advisory("checkout"))
    }

    fn add(&self, paths: &[&Path]) -> Result<(), AdvisoryError> {
        self.stage(paths).map_err(|e| e.into_advisory("add"))
    }

    fn commit(&self, message: &str) -> Result<(), AdvisoryError> {
        self.commit_index(message)
            .map(|_| ())
            .map_err(|e| e.into_advisory("commit"))
    }

    fn merge(&self, branch: &str, into: &str) -> Result<(), AdvisoryError> {
        self.merge_branch(branch, into)
            .map_err(|e| e.into_advisory("merge"))
    }
}

fn branch_ref(name: &str) -> String {
    format!("refs/heads/{}", name)
}
