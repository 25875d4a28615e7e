use std::path::Path;

use libdocloop_core::{DocloopError, Metadata};
use serde::Serialize;

use crate::cli::Cli;
use crate::context::DocloopContext;
use crate::output::{emit, note};

#[derive(Serialize)]
struct TrackOutput {
    version_id: String,
    file_path: String,
    metadata: Metadata,
}

pub fn run(cli: &Cli, file: &Path, meta: &[String]) -> Result<(), DocloopError> {
    let metadata = parse_metadata(meta)?;

    let ctx = DocloopContext::resolve(cli)?;
    let manager = ctx.session_manager()?;
    let version_id = manager.track(file, metadata.clone())?;

    emit(
        cli,
        TrackOutput {
            version_id: version_id.clone(),
            file_path: file.to_string_lossy().to_string(),
            metadata,
        },
    )?;
    note(cli, &format!("Tracked {} as {}", file.display(), version_id));

    Ok(())
}

/// Parse repeated `KEY=VALUE` arguments
fn parse_metadata(entries: &[String]) -> Result<Metadata, DocloopError> {
    let mut metadata = Metadata::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .filter(|(k, _)| !k.trim().is_empty())
            .ok_or_else(|| {
                DocloopError::InvalidArgs(format!("metadata must be KEY=VALUE, got '{}'", entry))
            })?;
        metadata.insert(key.trim().to_string(), value.to_string());
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata() {
        let parsed = parse_metadata(&["program=onboarding".into(), "note=a=b".into()]).unwrap();
        assert_eq!(parsed.get("program").map(String::as_str), Some("onboarding"));
        assert_eq!(parsed.get("note").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_parse_metadata_rejects_bare_words() {
        assert!(parse_metadata(&["oops".into()]).is_err());
        assert!(parse_metadata(&["=value".into()]).is_err());
    }
}
