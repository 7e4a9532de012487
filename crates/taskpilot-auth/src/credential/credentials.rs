//! The access/refresh token pair as one unit.

use std::fmt;

use taskpilot_core::error::AppError;
use taskpilot_core::traits::{ACCESS_TOKEN_KEY, CredentialStore, REFRESH_TOKEN_KEY};
use taskpilot_core::types::{RefreshResponse, TokenPair};

/// Both session tokens, read from or written to a [`CredentialStore`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived token used only for the refresh exchange.
    pub refresh_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Reads both tokens. A partial pair (one token missing or empty) is
    /// reported as `None`, same as a logged-out store.
    pub fn load(store: &dyn CredentialStore) -> Result<Option<Self>, AppError> {
        let access = store.get(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty());
        let refresh = store.get(REFRESH_TOKEN_KEY)?.filter(|t| !t.is_empty());

        Ok(match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Some(Self {
                access_token,
                refresh_token,
            }),
            _ => None,
        })
    }

    /// Writes both tokens.
    pub fn save(&self, store: &dyn CredentialStore) -> Result<(), AppError> {
        store.set(ACCESS_TOKEN_KEY, &self.access_token)?;
        store.set(REFRESH_TOKEN_KEY, &self.refresh_token)
    }

    /// Removes both tokens together.
    pub fn clear(store: &dyn CredentialStore) -> Result<(), AppError> {
        store.clear(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
    }

    /// Applies a refresh response: the access token is always replaced, the
    /// refresh token only when the server rotated it.
    pub fn apply_refresh(
        store: &dyn CredentialStore,
        response: &RefreshResponse,
    ) -> Result<(), AppError> {
        store.set(ACCESS_TOKEN_KEY, &response.access_token)?;
        if let Some(rotated) = &response.refresh_token {
            store.set(REFRESH_TOKEN_KEY, rotated)?;
        }
        Ok(())
    }
}

impl From<TokenPair> for Credentials {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}
