//! Authentication endpoints and the HTTP refresh exchange.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use taskpilot_auth::{Credentials, RefreshError, TokenRefresher};
use taskpilot_core::result::AppResult;
use taskpilot_core::types::{
    EmailRequest, LoginRequest, NewPasswordRequest, RefreshRequest, RefreshResponse,
    RegisterRequest, TokenPair,
};

use crate::dispatcher::{RequestDispatcher, error_detail};

/// Calls under `/auth/`.
#[derive(Debug, Clone)]
pub struct AuthApi {
    dispatcher: RequestDispatcher,
}

impl AuthApi {
    /// Wraps a dispatcher.
    pub fn new(dispatcher: RequestDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Exchanges email and password for a token pair and stores both tokens.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let pair: TokenPair = self.dispatcher.post("auth/token", &request).await?;

        Credentials::from(pair.clone()).save(self.dispatcher.store().as_ref())?;
        info!(email = %email, "Logged in");
        Ok(pair)
    }

    /// Registers a new account. The backend sends a verification email.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AppResult<Value> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let created = self.dispatcher.post("auth/register", &request).await?;
        info!(username = %username, email = %email, "Registered account");
        Ok(created)
    }

    /// Drops both stored tokens. Nothing is revoked server-side.
    pub fn logout(&self) -> AppResult<()> {
        Credentials::clear(self.dispatcher.store().as_ref())?;
        info!("Logged out");
        Ok(())
    }

    /// Confirms an email address with the token from the verification mail.
    pub async fn verify_email(&self, token: &str) -> AppResult<Value> {
        self.dispatcher
            .get_with_query("auth/verify-email", &[("token", token.to_string())])
            .await
    }

    /// Requests a password reset link.
    pub async fn forgot_password(&self, email: &str) -> AppResult<Value> {
        let request = EmailRequest {
            email: email.to_string(),
        };
        self.dispatcher.post("auth/forgot-password", &request).await
    }

    /// Sets a new password using the token from the reset mail.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<Value> {
        let request = NewPasswordRequest {
            new_password: new_password.to_string(),
        };
        self.dispatcher
            .execute(
                Method::POST,
                "auth/reset-password",
                &[("token", token.to_string())],
                Some(&request),
            )
            .await
    }
}

#[async_trait]
impl TokenRefresher for AuthApi {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, RefreshError> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };

        let response = self
            .dispatcher
            .send(Method::POST, "auth/refresh", &[], Some(&request))
            .await
            .map_err(|e| RefreshError::Transport(e.message))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = error_detail(&body).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("refresh rejected").to_string()
            });
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), "Refresh endpoint answered");
        serde_json::from_str(&body)
            .map_err(|e| RefreshError::Transport(format!("Unreadable refresh response: {e}")))
    }
}
