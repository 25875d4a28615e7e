use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form key/value metadata attached to a tracked version
pub type Metadata = BTreeMap<String, String>;

/// Whether a version is still the latest for its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Original,
    Superseded,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Original => "original",
            VersionStatus::Superseded => "superseded",
        }
    }
}

/// Immutable snapshot of a document at the time it was tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version_id: String,
    pub file_path: String,
    /// SHA-256 of the content, lowercase hex
    pub content_hash: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub tracked_at: DateTime<Utc>,
    /// Always `original` on disk; derived from the index when read back
    pub status: VersionStatus,
}
