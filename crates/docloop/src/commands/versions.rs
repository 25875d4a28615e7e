use std::path::Path;

use chrono::{DateTime, Utc};
use libdocloop_core::{DocloopError, Metadata, VersionRecord};
use serde::Serialize;

use super::{short_time, table};
use crate::cli::Cli;
use crate::context::DocloopContext;
use crate::output::{emit, note};

#[derive(Serialize)]
struct VersionsOutput {
    file_path: String,
    versions: Vec<VersionJson>,
    total: usize,
}

#[derive(Serialize)]
struct VersionJson {
    version_id: String,
    status: String,
    content_hash: String,
    tracked_at: DateTime<Utc>,
    metadata: Metadata,
}

impl From<&VersionRecord> for VersionJson {
    fn from(r: &VersionRecord) -> Self {
        Self {
            version_id: r.version_id.clone(),
            status: r.status.as_str().to_string(),
            content_hash: r.content_hash.clone(),
            tracked_at: r.tracked_at,
            metadata: r.metadata.clone(),
        }
    }
}

pub fn run(cli: &Cli, file: &Path) -> Result<(), DocloopError> {
    let ctx = DocloopContext::resolve(cli)?;
    let manager = ctx.session_manager()?;
    let history = manager.versions().history(file)?;

    let versions: Vec<VersionJson> = history.iter().map(VersionJson::from).collect();
    let total = versions.len();

    if !cli.json && !cli.quiet {
        let mut t = table(vec!["Version", "Status", "Hash", "Tracked", "Metadata"]);
        for v in &versions {
            let metadata = v
                .metadata
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            t.add_row(vec![
                v.version_id.clone(),
                v.status.clone(),
                v.content_hash[..12.min(v.content_hash.len())].to_string(),
                short_time(&v.tracked_at),
                metadata,
            ]);
        }
        note(cli, &t.to_string());
    }

    emit(
        cli,
        VersionsOutput {
            file_path: file.to_string_lossy().to_string(),
            versions,
            total,
        },
    )
}
