use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::{StoreWriter, StoreWriters, WriterError, WriterProvider};
use crate::config::StoreConfig;
use crate::types::ids::slugify;
use crate::types::suggestion::{SuggestedUpdate, Suggestion, WorkflowStep};

/// Serialization format of a structured store file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredFormat {
    Json,
    Yaml,
}

impl StructuredFormat {
    pub fn from_path(path: &Path) -> Result<Self, WriterError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(StructuredFormat::Json),
            Some("yaml") | Some("yml") => Ok(StructuredFormat::Yaml),
            other => Err(WriterError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// A JSON or YAML document on disk, read and written as a whole
#[derive(Debug, Clone)]
pub struct StructuredFile {
    path: PathBuf,
    format: StructuredFormat,
}

impl StructuredFile {
    pub fn open(path: &Path) -> Result<Self, WriterError> {
        Ok(Self {
            path: path.to_path_buf(),
            format: StructuredFormat::from_path(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the document; a missing file reads as an empty mapping
    pub fn read(&self) -> Result<Value, WriterError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Value::Object(Map::new()))
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(match self.format {
            StructuredFormat::Json => serde_json::from_str(&content)?,
            StructuredFormat::Yaml => serde_yaml::from_str(&content)?,
        })
    }

    /// Replace the document with write-temp-then-rename
    pub fn write(&self, value: &Value) -> Result<(), WriterError> {
        let content = match self.format {
            StructuredFormat::Json => serde_json::to_string_pretty(value)?,
            StructuredFormat::Yaml => serde_yaml::to_string(value)?,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn update(
        &self,
        f: impl FnOnce(&mut Map<String, Value>) -> Result<(), WriterError>,
    ) -> Result<(), WriterError> {
        let mut doc = self.read()?;
        let root = doc.as_object_mut().ok_or(WriterError::NotAMapping)?;
        f(root)?;
        self.write(&doc)
    }
}

/// Writes generic section updates into the customer-context document
#[derive(Debug, Clone)]
pub struct ContextStoreWriter {
    file: StructuredFile,
}

impl ContextStoreWriter {
    pub fn new(file: StructuredFile) -> Self {
        Self { file }
    }
}

impl StoreWriter for ContextStoreWriter {
    fn write(&self, suggestion: &Suggestion) -> Result<(), WriterError> {
        match &suggestion.suggested_update {
            SuggestedUpdate::Generic { additions, deletions, .. } => self.file.update(|root| {
                merge_lines(root, &slugify(&suggestion.section, '_'), additions, deletions)
            }),
            SuggestedUpdate::Workflow { .. } => Err(WriterError::Rejected(
                "workflow updates belong to the program configuration".to_string(),
            )),
        }
    }
}

/// Writes section and workflow updates into the program-config document
#[derive(Debug, Clone)]
pub struct ProgramConfigWriter {
    file: StructuredFile,
}

impl ProgramConfigWriter {
    pub fn new(file: StructuredFile) -> Self {
        Self { file }
    }
}

impl StoreWriter for ProgramConfigWriter {
    fn write(&self, suggestion: &Suggestion) -> Result<(), WriterError> {
        match &suggestion.suggested_update {
            SuggestedUpdate::Generic { additions, deletions, .. } => self.file.update(|root| {
                merge_lines(root, &slugify(&suggestion.section, '_'), additions, deletions)
            }),
            SuggestedUpdate::Workflow { modified_steps } => {
                self.file.update(|root| merge_steps(root, modified_steps))
            }
        }
    }
}

/// File-backed writers located through the `[stores]` config templates
#[derive(Debug, Clone)]
pub struct FileWriterProvider {
    root: PathBuf,
    stores: StoreConfig,
}

impl FileWriterProvider {
    pub fn new(root: &Path, stores: StoreConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            stores,
        }
    }
}

impl WriterProvider for FileWriterProvider {
    fn writers(&self, program_type: &str, customer_name: &str) -> StoreWriters {
        let context_path = self.stores.context_path(&self.root, program_type, customer_name);
        let program_path = self.stores.program_path(&self.root, program_type, customer_name);
        StoreWriters {
            context: file_writer(&context_path, ContextStoreWriter::new),
            program: file_writer(&program_path, ProgramConfigWriter::new),
        }
    }
}

fn file_writer<W: StoreWriter + 'static>(
    path: &Path,
    make: impl FnOnce(StructuredFile) -> W,
) -> Box<dyn StoreWriter> {
    match StructuredFile::open(path) {
        Ok(file) => Box::new(make(file)),
        Err(e) => Box::new(UnusableStore(e.to_string())),
    }
}

/// Stands in for a store whose path cannot be used, failing every write
struct UnusableStore(String);

impl StoreWriter for UnusableStore {
    fn write(&self, _suggestion: &Suggestion) -> Result<(), WriterError> {
        Err(WriterError::Rejected(self.0.clone()))
    }
}

/// Append new lines to a list field and drop removed ones
fn merge_lines(
    root: &mut Map<String, Value>,
    field: &str,
    additions: &[String],
    deletions: &[String],
) -> Result<(), WriterError> {
    let entry = root
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    let list = entry.as_array_mut().ok_or_else(|| WriterError::NotAList {
        field: field.to_string(),
    })?;

    let removed: Vec<&str> = deletions.iter().map(|d| strip_marker(d)).collect();
    list.retain(|item| !item.as_str().is_some_and(|s| removed.contains(&s)));

    for line in additions {
        let item = Value::String(strip_marker(line).to_string());
        if !list.contains(&item) {
            list.push(item);
        }
    }
    Ok(())
}

fn merge_steps(root: &mut Map<String, Value>, steps: &[WorkflowStep]) -> Result<(), WriterError> {
    let workflows = root
        .entry("workflows".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    let workflows = workflows.as_object_mut().ok_or_else(|| WriterError::NotAList {
        field: "workflows".to_string(),
    })?;
    let entry = workflows
        .entry("modified_steps".to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    let list = entry.as_array_mut().ok_or_else(|| WriterError::NotAList {
        field: "workflows.modified_steps".to_string(),
    })?;

    for step in steps {
        list.push(serde_json::json!({
            "content": strip_marker(&step.content),
            "action": step.action,
        }));
    }
    Ok(())
}

/// Strip list markup so stores hold plain values
fn strip_marker(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return rest.trim();
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix('.') {
            return rest.trim();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::suggestion::StepAction;
    use tempfile::tempdir;

    fn generic(section: &str, additions: &[&str], deletions: &[&str]) -> Suggestion {
        Suggestion {
            section: section.to_string(),
            suggested_update: SuggestedUpdate::Generic {
                additions: additions.iter().map(|s| s.to_string()).collect(),
                deletions: deletions.iter().map(|s| s.to_string()).collect(),
                net_change: additions.len() as i64 - deletions.len() as i64,
            },
            confidence: 1.0,
        }
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(strip_marker("- must support SSO"), "must support SSO");
        assert_eq!(strip_marker("12. Deploy"), "Deploy");
        assert_eq!(strip_marker("  plain "), "plain");
        assert_eq!(strip_marker("2024 plan"), "2024 plan");
    }

    #[test]
    fn test_context_writer_merges_yaml_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("context.yaml");
        std::fs::write(&path, "name: Acme\nrequirements:\n  - must support SSO\n  - legacy LDAP\n").unwrap();

        let writer = ContextStoreWriter::new(StructuredFile::open(&path).unwrap());
        writer
            .write(&generic("Requirements", &["- must support SCIM", "- must support SSO"], &["- legacy LDAP"]))
            .unwrap();

        let doc: serde_json::Value = serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["name"], "Acme");
        assert_eq!(
            doc["requirements"],
            serde_json::json!(["must support SSO", "must support SCIM"])
        );
    }

    #[test]
    fn test_context_writer_creates_missing_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/context.json");

        let writer = ContextStoreWriter::new(StructuredFile::open(&path).unwrap());
        writer.write(&generic("Business Objectives", &["- grow ARR"], &[])).unwrap();

        let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["business_objectives"], serde_json::json!(["grow ARR"]));
    }

    #[test]
    fn test_non_list_field_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("context.yaml");
        std::fs::write(&path, "requirements: none\n").unwrap();

        let writer = ContextStoreWriter::new(StructuredFile::open(&path).unwrap());
        let err = writer.write(&generic("Requirements", &["x"], &[])).unwrap_err();
        assert!(matches!(err, WriterError::NotAList { .. }));
        // Untouched on failure
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "requirements: none\n");
    }

    #[test]
    fn test_program_writer_appends_workflow_steps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("program.yaml");

        let writer = ProgramConfigWriter::new(StructuredFile::open(&path).unwrap());
        writer
            .write(&Suggestion {
                section: "workflows".to_string(),
                suggested_update: SuggestedUpdate::Workflow {
                    modified_steps: vec![WorkflowStep {
                        content: "3. Security review (Required)".to_string(),
                        action: StepAction::Add,
                    }],
                },
                confidence: 0.9,
            })
            .unwrap();

        let doc: serde_json::Value = serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            doc["workflows"]["modified_steps"],
            serde_json::json!([{ "content": "Security review (Required)", "action": "add" }])
        );
    }

    #[test]
    fn test_context_writer_rejects_workflow_payload() {
        let dir = tempdir().unwrap();
        let writer = ContextStoreWriter::new(StructuredFile::open(&dir.path().join("c.yaml")).unwrap());
        let err = writer
            .write(&Suggestion {
                section: "workflows".to_string(),
                suggested_update: SuggestedUpdate::Workflow { modified_steps: vec![] },
                confidence: 1.0,
            })
            .unwrap_err();
        assert!(matches!(err, WriterError::Rejected(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            StructuredFile::open(Path::new("context.ini")),
            Err(WriterError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_provider_resolves_templates() {
        let dir = tempdir().unwrap();
        let provider = FileWriterProvider::new(dir.path(), StoreConfig::default());
        let writers = provider.writers("Cloud Migration", "Acme Corp");
        writers.context.write(&generic("Stakeholders", &["- CFO"], &[])).unwrap();
        writers.program.write(&generic("API", &["- REST"], &[])).unwrap();

        assert!(dir.path().join("customers/acme-corp/context.yaml").exists());
        assert!(dir.path().join("programs/cloud-migration.yaml").exists());
    }
}
