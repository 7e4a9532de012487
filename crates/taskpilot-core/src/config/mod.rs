//! Client configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field has a default, so an empty configuration is valid.

pub mod api;
pub mod credentials;
pub mod logging;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::api::ApiConfig;
pub use self::credentials::CredentialsConfig;
pub use self::logging::LoggingConfig;
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Root client configuration.
///
/// Deserialization target for the merged configuration: the base file,
/// an environment overlay, and `TASKPILOT__*` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Credential storage settings.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Session and routing settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// `config_path` is the base file (extension optional), `env` selects
    /// the `config/{env}.toml` overlay. Both files are optional.
    pub fn load(config_path: &str, env: &str) -> Result<Self, AppError> {
        let base = config_path.strip_suffix(".toml").unwrap_or(config_path);

        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TASKPILOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let config = ClientConfig::load("does/not/exist.toml", "nowhere").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.session.login_route, "/login");
        assert_eq!(config.credentials.path, "data/credentials.json");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "https://tasks.example.com"
timeout_seconds = 5

[credentials]
path = "/tmp/tp-creds.json"
"#,
        )
        .unwrap();

        let config = ClientConfig::load(path.to_str().unwrap(), "nowhere").unwrap();
        assert_eq!(config.api.base_url, "https://tasks.example.com");
        assert_eq!(config.api.timeout_seconds, 5);
        assert_eq!(config.credentials.path, "/tmp/tp-creds.json");
        // Untouched sections keep their defaults.
        assert_eq!(config.session.login_route, "/login");
    }
}
