use std::path::{Path, PathBuf};
use std::sync::Arc;

use libdocloop_core::apply::FileWriterProvider;
use libdocloop_core::{
    load_config, CommandGenerator, Config, DocloopError, FsBackend, SessionManager,
};
use libdocloop_git::GitVcs;
use tracing::debug;

use crate::cli::Cli;

/// Default data directory, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = ".docloop";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "DOCLOOP_HOME";

/// Resolved data directory, config and storage for a command
pub struct DocloopContext {
    pub data_dir: PathBuf,
    pub config: Config,
    backend: Arc<FsBackend>,
}

impl DocloopContext {
    /// Data directory from `--data-dir`, then `DOCLOOP_HOME`, then `./.docloop`
    pub fn data_dir(cli: &Cli) -> Result<PathBuf, DocloopError> {
        let dir = match &cli.data_dir {
            Some(dir) => dir.clone(),
            None => match std::env::var(DATA_DIR_ENV) {
                Ok(home) if !home.is_empty() => PathBuf::from(home),
                _ => PathBuf::from(DEFAULT_DATA_DIR),
            },
        };
        if dir.is_absolute() {
            Ok(dir)
        } else {
            Ok(std::env::current_dir()?.join(dir))
        }
    }

    pub fn resolve(cli: &Cli) -> Result<Self, DocloopError> {
        let data_dir = Self::data_dir(cli)?;
        let config = load_config(&data_dir)?.unwrap_or_default();
        let backend = Arc::new(FsBackend::open(&data_dir)?);
        debug!(data_dir = %data_dir.display(), "resolved context");
        Ok(Self {
            data_dir,
            config,
            backend,
        })
    }

    /// Directory the store templates and generator command are relative to
    pub fn project_root(&self) -> &Path {
        self.data_dir.parent().unwrap_or(self.data_dir.as_path())
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }

    /// Session manager wired to file stores, git (when available) and the
    /// configured generator
    pub fn session_manager(&self) -> Result<SessionManager, DocloopError> {
        let root = self.project_root();
        let mut manager = SessionManager::new(self.backend.clone(), self.config.clone())
            .with_writers(Box::new(FileWriterProvider::new(root, self.config.stores.clone())));

        if self.config.vcs.enabled {
            match GitVcs::discover(root) {
                Ok(vcs) => manager = manager.with_vcs(Box::new(vcs)),
                Err(e) => debug!(error = %e, "version control unavailable"),
            }
        }

        if self.config.generator.is_configured() {
            let generator = CommandGenerator::new(self.config.generator.command.clone(), root)?;
            manager = manager.with_generator(Box::new(generator));
        }

        Ok(manager)
    }
}
