//! Session and routing configuration.

use serde::{Deserialize, Serialize};

/// Settings for the route guard and resource controllers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Entry point unauthenticated users are redirected to.
    #[serde(default = "default_login_route")]
    pub login_route: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_route: default_login_route(),
        }
    }
}

fn default_login_route() -> String {
    "/login".to_string()
}
