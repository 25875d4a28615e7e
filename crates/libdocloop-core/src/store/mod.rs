//! Version tracking for generated documents.
//!
//! Every `track` writes an immutable `VersionRecord` under `versions/` and moves
//! the document's entry in `index.json` to the new id. Older records stay on
//! disk and read back as `superseded`.

mod reports;
mod sessions;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{read_json, write_json, StorageBackend};
use crate::error::DocloopError;
use crate::hash::content_hash;
use crate::types::ids::version_id;
use crate::types::version::{Metadata, VersionRecord, VersionStatus};

pub use reports::ReportStore;
pub use sessions::SessionStore;

/// Key of the path → version mapping
pub const INDEX_KEY: &str = "index.json";

/// Schema version of the index document
pub const INDEX_SCHEMA_VERSION: u32 = 1;

/// Latest version and full history of one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DocumentEntry {
    latest: String,
    /// Oldest first, append-only
    versions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionIndex {
    schema_version: u32,
    documents: BTreeMap<String, DocumentEntry>,
}

impl Default for VersionIndex {
    fn default() -> Self {
        Self {
            schema_version: INDEX_SCHEMA_VERSION,
            documents: BTreeMap::new(),
        }
    }
}

/// Stable key for a document path.
///
/// Existing files are canonicalised so `./doc.md` and `/abs/doc.md` share one
/// history; paths that do not exist are used as given.
pub fn document_key(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

/// Baseline snapshots plus the document → latest version lookup
#[derive(Clone)]
pub struct VersionStore {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for VersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionStore").finish_non_exhaustive()
    }
}

impl VersionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Read a document from disk and record it as a new version
    pub fn track(&self, file_path: &Path, metadata: Metadata) -> Result<String, DocloopError> {
        let content = std::fs::read_to_string(file_path)?;
        self.track_content(&document_key(file_path), &content, metadata)
    }

    /// Record `content` as the latest version of the document keyed `key`
    pub fn track_content(
        &self,
        key: &str,
        content: &str,
        metadata: Metadata,
    ) -> Result<String, DocloopError> {
        let mut tracked_at = Utc::now();
        let hash = content_hash(content);
        let mut id = version_id(&tracked_at, &hash);
        // Records are immutable; step past an id already taken this millisecond
        while self.backend.read(&record_key(&id))?.is_some() {
            tracked_at += Duration::milliseconds(1);
            id = version_id(&tracked_at, &hash);
        }

        let record = VersionRecord {
            version_id: id.clone(),
            file_path: key.to_string(),
            content_hash: hash,
            content: content.to_string(),
            metadata,
            tracked_at,
            status: VersionStatus::Original,
        };
        write_json(self.backend.as_ref(), &record_key(&id), &record)?;

        let mut index = self.load_index()?;
        let entry = index.documents.entry(key.to_string()).or_default();
        if entry.versions.last() != Some(&id) {
            entry.versions.push(id.clone());
        }
        entry.latest = id.clone();
        write_json(self.backend.as_ref(), INDEX_KEY, &index)?;

        info!(version_id = %id, path = %key, "tracked document version");
        Ok(id)
    }

    /// Latest version id of a document on disk
    pub fn resolve(&self, file_path: &Path) -> Result<String, DocloopError> {
        self.resolve_key(&document_key(file_path))
    }

    /// Latest version id of the document keyed `key`
    pub fn resolve_key(&self, key: &str) -> Result<String, DocloopError> {
        let index = self.load_index()?;
        index
            .documents
            .get(key)
            .map(|entry| entry.latest.clone())
            .ok_or_else(|| DocloopError::NotTracked(key.to_string()))
    }

    /// Fetch a version record; its status reflects whether it is still the latest
    pub fn get(&self, version_id: &str) -> Result<VersionRecord, DocloopError> {
        let mut record: VersionRecord = read_json(self.backend.as_ref(), &record_key(version_id))?
            .ok_or_else(|| DocloopError::version_not_found(version_id))?;
        let index = self.load_index()?;
        record.status = status_in(&index, &record);
        debug!(version_id, status = record.status.as_str(), "loaded version");
        Ok(record)
    }

    /// The latest version record of a document on disk
    pub fn latest(&self, file_path: &Path) -> Result<VersionRecord, DocloopError> {
        let id = self.resolve(file_path)?;
        self.get(&id)
    }

    /// Every version of a document, oldest first
    pub fn history(&self, file_path: &Path) -> Result<Vec<VersionRecord>, DocloopError> {
        self.history_key(&document_key(file_path))
    }

    pub fn history_key(&self, key: &str) -> Result<Vec<VersionRecord>, DocloopError> {
        let index = self.load_index()?;
        let entry = index
            .documents
            .get(key)
            .ok_or_else(|| DocloopError::NotTracked(key.to_string()))?;

        let mut records = Vec::with_capacity(entry.versions.len());
        for id in &entry.versions {
            let mut record: VersionRecord = read_json(self.backend.as_ref(), &record_key(id))?
                .ok_or_else(|| DocloopError::version_not_found(id))?;
            record.status = status_in(&index, &record);
            records.push(record);
        }
        Ok(records)
    }

    fn load_index(&self) -> Result<VersionIndex, DocloopError> {
        Ok(read_json(self.backend.as_ref(), INDEX_KEY)?.unwrap_or_default())
    }
}

fn record_key(version_id: &str) -> String {
    format!("versions/{}.json", version_id)
}

fn status_in(index: &VersionIndex, record: &VersionRecord) -> VersionStatus {
    match index.documents.get(&record.file_path) {
        Some(entry) if entry.latest != record.version_id => VersionStatus::Superseded,
        _ => VersionStatus::Original,
    }
}
