//! Regenerates a document after its configuration has been updated.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::config::expand_template;
use crate::error::DocloopError;
use crate::store::VersionStore;
use crate::types::version::Metadata;

/// Produces a fresh document from program and customer configuration
pub trait DocumentGenerator {
    fn generate(&self, program_type: &str, customer_name: &str) -> Result<PathBuf, DocloopError>;
}

/// Runs an external command and reads the produced path from its stdout.
///
/// Arguments may contain `{program}` and `{customer}`. The last non-empty
/// line of stdout is taken as the document path, relative to `working_dir`
/// unless absolute.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: Vec<String>,
    working_dir: PathBuf,
}

impl CommandGenerator {
    pub fn new(command: Vec<String>, working_dir: &Path) -> Result<Self, DocloopError> {
        if command.is_empty() {
            return Err(DocloopError::InvalidArgs(
                "generator command is empty".to_string(),
            ));
        }
        Ok(Self {
            command,
            working_dir: working_dir.to_path_buf(),
        })
    }
}

impl DocumentGenerator for CommandGenerator {
    fn generate(&self, program_type: &str, customer_name: &str) -> Result<PathBuf, DocloopError> {
        let args: Vec<String> = self
            .command
            .iter()
            .map(|arg| expand_template(arg, program_type, customer_name))
            .collect();

        let output = Command::new(&args[0])
            .args(&args[1..])
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| DocloopError::Generator(format!("failed to run {}: {}", args[0], e)))?;

        if !output.status.success() {
            return Err(DocloopError::Generator(format!(
                "{} exited with {}: {}",
                args[0],
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let produced = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .ok_or_else(|| DocloopError::Generator(format!("{} printed no output path", args[0])))?;

        let path = PathBuf::from(produced);
        Ok(if path.is_absolute() {
            path
        } else {
            self.working_dir.join(path)
        })
    }
}

/// Regenerates a document and registers the result as its next baseline
pub struct RegenerationTrigger<'a> {
    generator: &'a dyn DocumentGenerator,
    versions: &'a VersionStore,
}

impl<'a> RegenerationTrigger<'a> {
    pub fn new(generator: &'a dyn DocumentGenerator, versions: &'a VersionStore) -> Self {
        Self { generator, versions }
    }

    /// Returns the path of the new document and its version id
    pub fn regenerate(
        &self,
        program_type: &str,
        customer_name: &str,
    ) -> Result<(PathBuf, String), DocloopError> {
        let path = self.generator.generate(program_type, customer_name)?;

        let mut metadata = Metadata::new();
        metadata.insert("program_type".to_string(), program_type.to_string());
        metadata.insert("customer_name".to_string(), customer_name.to_string());
        metadata.insert("source".to_string(), "regeneration".to_string());

        let version_id = self.versions.track(&path, metadata)?;
        info!(path = %path.display(), version_id = %version_id, "regenerated document");
        Ok((path, version_id))
    }
}
