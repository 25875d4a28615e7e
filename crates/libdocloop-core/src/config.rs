use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DocloopError;
use crate::types::ids::slugify;

/// Name of the config file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default confidence a suggestion must exceed to be applied
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Workspace configuration stored in `<data_dir>/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feedback: FeedbackConfig,
    pub vcs: VcsConfig,
    pub stores: StoreConfig,
    pub generator: GeneratorConfig,
}

/// How processed feedback is applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Suggestions must be strictly above this to be applied
    pub confidence_threshold: f64,
    /// When set, auto-apply requests are ignored and suggestions wait for review
    pub require_approval: bool,
    /// Commit each edited copy on the session's tracking branch
    pub auto_commit: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            require_approval: false,
            auto_commit: true,
        }
    }
}

/// Advisory version-control settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsConfig {
    pub enabled: bool,
    /// Session branches are named `<tracking_branch>/<session_id>`
    pub tracking_branch: String,
    pub main_branch: String,
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tracking_branch: "feedback".to_string(),
            main_branch: "main".to_string(),
        }
    }
}

impl VcsConfig {
    pub fn session_branch(&self, session_id: &str) -> String {
        format!("{}/{}", self.tracking_branch, session_id)
    }
}

/// Locations of the structured stores, relative to the project root.
///
/// `{customer}` and `{program}` are replaced with slugs of the session's
/// customer name and program type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub context: String,
    pub program: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            context: "customers/{customer}/context.yaml".to_string(),
            program: "programs/{program}.yaml".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn context_path(&self, root: &Path, program_type: &str, customer_name: &str) -> PathBuf {
        root.join(expand_template(&self.context, program_type, customer_name))
    }

    pub fn program_path(&self, root: &Path, program_type: &str, customer_name: &str) -> PathBuf {
        root.join(expand_template(&self.program, program_type, customer_name))
    }
}

/// External document generator invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Program and arguments; `{program}` and `{customer}` are substituted
    pub command: Vec<String>,
}

impl GeneratorConfig {
    pub fn is_configured(&self) -> bool {
        !self.command.is_empty()
    }
}

/// Substitute `{program}` and `{customer}` with slugs of the given names
pub fn expand_template(template: &str, program_type: &str, customer_name: &str) -> String {
    template
        .replace("{program}", &slugify(program_type, '-'))
        .replace("{customer}", &slugify(customer_name, '-'))
}

/// Load config from `<data_dir>/config.toml`
pub fn load_config(data_dir: &Path) -> Result<Option<Config>, DocloopError> {
    let config_path = data_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&config_path)?;
    let config: Config = toml::from_str(&content)?;
    if !(0.0..=1.0).contains(&config.feedback.confidence_threshold) {
        return Err(DocloopError::InvalidArgs(format!(
            "confidence_threshold must be within [0, 1], got {}",
            config.feedback.confidence_threshold
        )));
    }
    Ok(Some(config))
}

/// Save config to `<data_dir>/config.toml`
pub fn save_config(data_dir: &Path, config: &Config) -> Result<(), DocloopError> {
    std::fs::create_dir_all(data_dir)?;
    let config_path = data_dir.join(CONFIG_FILE);
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&config_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();

        let mut config = Config::default();
        config.feedback.confidence_threshold = 0.75;
        config.vcs.enabled = false;
        config.generator.command = vec!["docgen".into(), "{program}".into(), "{customer}".into()];

        save_config(dir.path(), &config).unwrap();
        let loaded = load_config(dir.path()).unwrap().unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempdir().unwrap();
        assert!(load_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[feedback]\nrequire_approval = true\n",
        )
        .unwrap();

        let loaded = load_config(dir.path()).unwrap().unwrap();
        assert!(loaded.feedback.require_approval);
        assert_eq!(loaded.feedback.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(loaded.vcs.tracking_branch, "feedback");
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[feedback]\nconfidence_threshold = 1.5\n",
        )
        .unwrap();

        assert!(matches!(load_config(dir.path()), Err(DocloopError::InvalidArgs(_))));
    }

    #[test]
    fn test_store_paths_expand_slugs() {
        let stores = StoreConfig::default();
        let root = Path::new("/work");
        assert_eq!(
            stores.context_path(root, "Cloud Migration", "Acme Corp"),
            PathBuf::from("/work/customers/acme-corp/context.yaml")
        );
        assert_eq!(
            stores.program_path(root, "Cloud Migration", "Acme Corp"),
            PathBuf::from("/work/programs/cloud-migration.yaml")
        );
    }

    #[test]
    fn test_session_branch_name() {
        assert_eq!(VcsConfig::default().session_branch("session_1"), "feedback/session_1");
    }
}
