//! Unverified decoding of JWT-shaped access tokens.
//!
//! # Trust boundary
//!
//! The client holds no verification key, so signatures are never checked.
//! The decoded expiry only decides *when* to refresh; it grants nothing.
//! The backend re-validates the bearer token on every request, and a
//! forged or tampered token simply fails there.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a token could not be decoded.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token is not three non-empty dot-separated segments.
    #[error("token must have three dot-separated segments, found {0}")]
    Malformed(usize),
    /// The payload segment is not base64url.
    #[error("token payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    /// The payload segment is not JSON.
    #[error("token payload is not JSON: {0}")]
    Payload(#[from] serde_json::Error),
    /// The payload is JSON but not an object.
    #[error("token payload is not a JSON object")]
    NotAnObject,
    /// The payload carries no numeric `exp` claim.
    #[error("token payload has no numeric exp claim")]
    MissingExpiry,
}

/// Expiry and claims read from an access token.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    /// `exp` claim, seconds since the Unix epoch.
    expires_at: i64,
    /// Every payload claim, `exp` included.
    claims: Map<String, Value>,
}

impl DecodedToken {
    /// Expiry as seconds since the Unix epoch.
    pub fn expires_at_epoch_seconds(&self) -> i64 {
        self.expires_at
    }

    /// Expiry as a UTC timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// A token is usable only while `exp` is strictly in the future.
    pub fn is_expired_at(&self, now_epoch_seconds: i64) -> bool {
        self.expires_at <= now_epoch_seconds
    }

    /// Seconds left until expiry (0 if expired).
    pub fn remaining_seconds(&self, now_epoch_seconds: i64) -> u64 {
        u64::try_from(self.expires_at.saturating_sub(now_epoch_seconds)).unwrap_or(0)
    }

    /// All claims of the payload.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// A single claim.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Human-facing identity of the token holder: `sub`, then `username`,
    /// then `email`.
    pub fn subject(&self) -> Option<&str> {
        ["sub", "username", "email"]
            .iter()
            .find_map(|name| self.claims.get(*name).and_then(Value::as_str))
    }
}

/// Decodes access tokens without contacting the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenInspector;

impl TokenInspector {
    /// Decodes the payload of `token` and extracts its expiry.
    ///
    /// Callers must treat any error as "not authorized".
    pub fn decode(token: &str) -> Result<DecodedToken, TokenError> {
        let segments: Vec<&str> = token.trim().split('.').collect();
        if segments.len() != 3 || segments[..2].iter().any(|s| s.is_empty()) {
            return Err(TokenError::Malformed(segments.len()));
        }

        // Some issuers keep the base64 padding.
        let payload = URL_SAFE_NO_PAD.decode(segments[1].trim_end_matches('='))?;
        let claims = match serde_json::from_slice::<Value>(&payload)? {
            Value::Object(map) => map,
            _ => return Err(TokenError::NotAnObject),
        };

        let expires_at = claims
            .get("exp")
            .and_then(|exp| exp.as_i64().or_else(|| exp.as_f64().map(|f| f.floor() as i64)))
            .ok_or(TokenError::MissingExpiry)?;

        Ok(DecodedToken { expires_at, claims })
    }
}
