//! The refresh exchange seam between the authorizer and the backend.

use async_trait::async_trait;
use thiserror::Error;

use taskpilot_core::types::RefreshResponse;

/// Why a refresh exchange did not produce a new access token.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// The backend answered and declined the refresh token.
    #[error("refresh token rejected ({status}): {message}")]
    Rejected {
        /// HTTP status of the rejection.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },
    /// No usable answer: network failure, timeout, or unreadable body.
    #[error("refresh exchange failed: {0}")]
    Transport(String),
}

/// Exchanges a refresh token for a new access token.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait TokenRefresher: Send + Sync + 'static {
    /// Sends `refresh_token` to the backend's refresh endpoint.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, RefreshError>;
}
