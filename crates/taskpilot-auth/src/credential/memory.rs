//! In-process credential store.

use dashmap::DashMap;

use taskpilot_core::result::AppResult;
use taskpilot_core::traits::CredentialStore;

/// Credential store backed by a concurrent map. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: DashMap<String, String>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, name: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(name).map(|entry| entry.value().clone()))
    }

    fn set(&self, name: &str, value: &str) -> AppResult<()> {
        self.entries.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, names: &[&str]) -> AppResult<()> {
        for name in names {
            self.entries.remove(*name);
        }
        Ok(())
    }
}
