//! Credential store persisted as a JSON object on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use taskpilot_core::error::AppError;
use taskpilot_core::result::AppResult;
use taskpilot_core::traits::CredentialStore;

/// File-backed credential store.
///
/// The file is read once at open and rewritten in full on every change,
/// through a sibling temporary file and a rename. Values are stored in
/// plain text.
#[derive(Debug)]
pub struct FileCredentialStore {
    /// Location of the JSON file.
    path: PathBuf,
    /// In-memory view of the file contents.
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileCredentialStore {
    /// Opens the store at `path`. A missing or empty file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                AppError::storage(format!(
                    "Credential file {} is not a JSON object: {e}",
                    path.display()
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened credential file");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, name: &str) -> AppResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AppError::internal("Credential store lock poisoned"))?;
        Ok(entries.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AppError::internal("Credential store lock poisoned"))?;
        let mut next = entries.clone();
        next.insert(name.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn clear(&self, names: &[&str]) -> AppResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AppError::internal("Credential store lock poisoned"))?;
        if !names.iter().any(|name| entries.contains_key(*name)) {
            return Ok(());
        }
        let mut next = entries.clone();
        for name in names {
            next.remove(*name);
        }
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCredentialStore::open(dir.path().join("creds.json")).unwrap();
        assert_eq!(store.get("access_token").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("creds.json");

        let store = FileCredentialStore::open(&path).unwrap();
        store.set("access_token", "a.b.c").unwrap();
        store.set("refresh_token", "r.s.t").unwrap();
        drop(store);

        let reopened = FileCredentialStore::open(&path).unwrap();
        assert_eq!(reopened.get("access_token").unwrap(), Some("a.b.c".to_string()));
        assert_eq!(reopened.get("refresh_token").unwrap(), Some("r.s.t".to_string()));
    }

    #[test]
    fn test_clear_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("creds.json");

        let store = FileCredentialStore::open(&path).unwrap();
        store.set("access_token", "a").unwrap();
        store.set("refresh_token", "r").unwrap();
        store.clear(&["access_token", "refresh_token"]).unwrap();

        let reopened = FileCredentialStore::open(&path).unwrap();
        assert_eq!(reopened.get("access_token").unwrap(), None);
        assert_eq!(reopened.get("refresh_token").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("creds.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = FileCredentialStore::open(&path).unwrap_err();
        assert_eq!(err.kind, taskpilot_core::error::ErrorKind::Storage);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("creds.json");
        let store = FileCredentialStore::open(&path).unwrap();
        fs::create_dir(dir.path().join("creds.json.tmp")).unwrap();

        assert!(store.set("access_token", "leaked").is_err());
        assert_eq!(store.get("access_token").unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_clear_keeps_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("creds.json");
        let store = FileCredentialStore::open(&path).unwrap();
        store.set("access_token", "a").unwrap();
        let written = fs::read_to_string(&path).unwrap();
        fs::create_dir(dir.path().join("creds.json.tmp")).unwrap();

        assert!(store.clear(&["access_token"]).is_err());
        assert_eq!(store.get("access_token").unwrap(), Some("a".to_string()));
        assert_eq!(fs::read_to_string(&path).unwrap(), written);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("creds.json");
        let store = FileCredentialStore::open(&path).unwrap();
        store.set("access_token", "a").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
