//! Credential storage configuration.

use serde::{Deserialize, Serialize};

/// Location of the persisted access/refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Path to the JSON credential file. Stored in plain text.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

fn default_path() -> String {
    "data/credentials.json".to_string()
}
