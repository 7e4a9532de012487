//! Credential store trait for pluggable token persistence.

use crate::result::AppResult;

/// Key under which the access token is stored.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Key under which the refresh token is stored.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// A dumb, synchronous string map holding the session credentials.
///
/// Implementations do not expire or encrypt anything. Every write is a
/// whole-value replacement and is visible to the next read on the same
/// store, so concurrent writers resolve as last-write-wins.
pub trait CredentialStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by name. Returns `None` if nothing is stored.
    fn get(&self, name: &str) -> AppResult<Option<String>>;

    /// Store a value, replacing any previous one.
    fn set(&self, name: &str, value: &str) -> AppResult<()>;

    /// Remove all of the given names in one operation.
    fn clear(&self, names: &[&str]) -> AppResult<()>;
}
