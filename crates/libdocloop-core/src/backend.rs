//! Storage backends for persisted records.
//!
//! Records are addressed by slash-separated keys such as `versions/<id>.json`.
//! The filesystem backend writes every key with write-temp-then-rename so a
//! reader never observes a partially written record or index.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DocloopError;

/// Key/value persistence used by the version, session and report stores
pub trait StorageBackend {
    /// Read a key, `None` if it was never written
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DocloopError>;

    /// Replace the value of a key atomically
    fn write(&self, key: &str, data: &[u8]) -> Result<(), DocloopError>;

    /// Keys directly under `prefix` (e.g. `sessions/`), sorted
    fn list(&self, prefix: &str) -> Result<Vec<String>, DocloopError>;
}

/// Read and deserialize a JSON record
pub fn read_json<T: DeserializeOwned>(
    backend: &dyn StorageBackend,
    key: &str,
) -> Result<Option<T>, DocloopError> {
    match backend.read(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Serialize and write a JSON record
pub fn write_json<T: Serialize>(
    backend: &dyn StorageBackend,
    key: &str,
    value: &T,
) -> Result<(), DocloopError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    backend.write(key, &bytes)
}

/// Backend rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Open a backend at `root`, creating the directory if needed
    pub fn open(root: &Path) -> Result<Self, DocloopError> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DocloopError> {
        if key.is_empty() || key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(DocloopError::InvalidArgs(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.root.join(key))
    }
}

impl StorageBackend for FsBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DocloopError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<(), DocloopError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);
        std::fs::write(&temp_path, data)?;
        std::fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, DocloopError> {
        let prefix = prefix.trim_end_matches('/');
        let dir = self.path_for(prefix)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            // Leftovers from an interrupted write
            if name.ends_with(".tmp") {
                continue;
            }
            keys.push(format!("{}/{}", prefix, name));
        }
        keys.sort();
        Ok(keys)
    }
}

/// Backend held entirely in memory, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, Vec<u8>>>, DocloopError> {
        self.entries
            .lock()
            .map_err(|_| DocloopError::Internal("memory backend lock poisoned".to_string()))
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DocloopError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<(), DocloopError> {
        self.entries()?.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, DocloopError> {
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        Ok(self
            .entries()?
            .keys()
            .filter(|k| k.starts_with(&prefix) && !k[prefix.len()..].contains('/'))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise(backend: &dyn StorageBackend) {
        assert!(backend.read("sessions/a.json").unwrap().is_none());

        backend.write("sessions/b.json", b"{}").unwrap();
        backend.write("sessions/a.json", b"[]").unwrap();
        backend.write("versions/v.json", b"1").unwrap();
        backend.write("index.json", b"{}").unwrap();

        assert_eq!(backend.read("sessions/a.json").unwrap().unwrap(), b"[]");
        assert_eq!(
            backend.list("sessions/").unwrap(),
            vec!["sessions/a.json".to_string(), "sessions/b.json".to_string()]
        );
        assert!(backend.list("reports").unwrap().is_empty());

        // Overwrite replaces
        backend.write("sessions/a.json", b"[1]").unwrap();
        assert_eq!(backend.read("sessions/a.json").unwrap().unwrap(), b"[1]");
    }

    #[test]
    fn test_memory_backend() {
        exercise(&MemoryBackend::new());
    }

    #[test]
    fn test_fs_backend() {
        let dir = tempdir().unwrap();
        let backend = FsBackend::open(&dir.path().join("data")).unwrap();
        exercise(&backend);

        // No temp files left behind by atomic writes
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("data/sessions"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_fs_backend_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let backend = FsBackend::open(dir.path()).unwrap();
        assert!(matches!(
            backend.write("../outside.json", b"x"),
            Err(DocloopError::InvalidArgs(_))
        ));
    }

    #[test]
    fn test_json_helpers() {
        let backend = MemoryBackend::new();
        write_json(&backend, "index.json", &vec![1, 2, 3]).unwrap();
        let loaded: Option<Vec<i32>> = read_json(&backend, "index.json").unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }
}
