//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use wiremock::MockServer;

use taskpilot_auth::MemoryCredentialStore;
use taskpilot_client::TaskPilotClient;
use taskpilot_core::config::ClientConfig;
use taskpilot_core::traits::{ACCESS_TOKEN_KEY, CredentialStore, REFRESH_TOKEN_KEY};

/// A client pointed at a fresh mock backend.
pub struct TestApp {
    pub server: MockServer,
    pub store: Arc<MemoryCredentialStore>,
    pub client: TaskPilotClient,
}

impl TestApp {
    /// Starts the mock backend with an empty credential store.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let mut config = ClientConfig::default();
        config.api.base_url = server.uri();
        config.api.timeout_seconds = 5;

        let store = Arc::new(MemoryCredentialStore::new());
        let client = TaskPilotClient::new(&config, store.clone()).expect("client");

        Self {
            server,
            store,
            client,
        }
    }

    /// Starts the mock backend with a session valid for another hour.
    pub async fn logged_in() -> Self {
        let app = Self::new().await;
        app.store_tokens(&token_expiring_in(3600), "refresh-1");
        app
    }

    pub fn store_tokens(&self, access: &str, refresh: &str) {
        self.store.set(ACCESS_TOKEN_KEY, access).unwrap();
        self.store.set(REFRESH_TOKEN_KEY, refresh).unwrap();
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY).unwrap()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY).unwrap()
    }

    /// Number of requests the mock backend has seen.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

/// HS256 token whose `exp` lies `offset_seconds` from now.
pub fn token_expiring_in(offset_seconds: i64) -> String {
    encode(
        &Header::default(),
        &serde_json::json!({
            "sub": "ada@example.com",
            "exp": Utc::now().timestamp() + offset_seconds,
        }),
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .expect("encode token")
}

/// A task as the backend serializes it.
pub fn task_json(id: i64, description: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "description": description,
        "start_date": "2025-07-20T08:00:00",
        "end_date": "2025-07-22T13:30:00",
        "estimated_hr": 4.0,
        "done_hr": 1.5,
        "is_repititive": false,
        "status": status,
        "is_stopped": status == "stopped",
        "main_task_id": null,
        "subtasks": [],
        "assignees": [],
        "owner_id": 1
    })
}
