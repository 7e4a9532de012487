//! Session authorizer: validates the stored session and refreshes it on expiry.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use taskpilot_core::traits::CredentialStore;

use super::refresher::{RefreshError, TokenRefresher};
use crate::credential::Credentials;
use crate::token::TokenInspector;

/// Outcome of one session evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// A token is missing, or the access token could not be decoded.
    NoCredentials,
    /// The access token is unexpired, or a refresh just replaced it.
    Valid,
    /// The access token is expired and a refresh token is available.
    /// Only observed transiently while the exchange is running.
    ExpiredRefreshable,
    /// The refresh exchange failed. Stored credentials are left untouched.
    RefreshFailed,
}

impl SessionState {
    /// Whether a protected operation may proceed.
    pub fn is_authorized(self) -> bool {
        self == Self::Valid
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no_credentials"),
            Self::Valid => write!(f, "valid"),
            Self::ExpiredRefreshable => write!(f, "expired_refreshable"),
            Self::RefreshFailed => write!(f, "refresh_failed"),
        }
    }
}

/// A refresh exchange every concurrent caller can await.
type InflightRefresh = Shared<BoxFuture<'static, SessionState>>;

/// Decides whether the current session is usable, refreshing it if expired.
///
/// The decision is recomputed from the credential store on every call.
/// At most one refresh exchange is in flight at a time: callers that find
/// the access token expired while an exchange is running await its result
/// instead of starting their own.
#[derive(Clone)]
pub struct SessionAuthorizer {
    /// Where the token pair lives.
    store: Arc<dyn CredentialStore>,
    /// Performs the refresh exchange.
    refresher: Arc<dyn TokenRefresher>,
    /// The refresh currently running, if any.
    inflight: Arc<Mutex<Option<InflightRefresh>>>,
}

impl fmt::Debug for SessionAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionAuthorizer")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl SessionAuthorizer {
    /// Creates an authorizer over the given store and refresh exchange.
    pub fn new(store: Arc<dyn CredentialStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            store,
            refresher,
            inflight: Arc::new(Mutex::new(None)),
        }
    }

    /// The credential store this authorizer reads and updates.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Returns `true` when a protected operation may proceed.
    ///
    /// Never fails: every failure mode degrades to `false`.
    pub async fn ensure_authorized(&self) -> bool {
        self.evaluate().await.is_authorized()
    }

    /// Evaluates the session and returns the state it settled in.
    ///
    /// 1. Either token missing, or the access token undecodable:
    ///    [`SessionState::NoCredentials`], no network call.
    /// 2. Access token unexpired: [`SessionState::Valid`], no network call.
    /// 3. Otherwise one refresh exchange (shared with concurrent callers),
    ///    ending in [`SessionState::Valid`] or [`SessionState::RefreshFailed`].
    pub async fn evaluate(&self) -> SessionState {
        let credentials = match Credentials::load(self.store.as_ref()) {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                debug!("No stored credentials");
                return SessionState::NoCredentials;
            }
            Err(e) => {
                warn!(error = %e, "Credential store unreadable, treating session as absent");
                return SessionState::NoCredentials;
            }
        };

        let decoded = match TokenInspector::decode(&credentials.access_token) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(error = %e, "Access token malformed");
                return SessionState::NoCredentials;
            }
        };

        let now = Utc::now().timestamp();
        if !decoded.is_expired_at(now) {
            debug!(
                remaining_seconds = decoded.remaining_seconds(now),
                "Access token valid"
            );
            return SessionState::Valid;
        }

        debug!(
            state = %SessionState::ExpiredRefreshable,
            expired_at = decoded.expires_at_epoch_seconds(),
            "Access token expired, refreshing"
        );
        self.refresh_once(credentials.access_token, credentials.refresh_token)
            .await
    }

    /// Joins the running refresh, or starts one.
    async fn refresh_once(&self, expired_access: String, refresh_token: String) -> SessionState {
        let pending = {
            let mut slot = self.inflight.lock().await;
            match slot.clone() {
                Some(pending) => {
                    debug!("Joining in-flight refresh");
                    pending
                }
                None => {
                    // A refresh may have finished between our read and the lock.
                    let refresh_token = match Credentials::load(self.store.as_ref()) {
                        Ok(Some(current)) if current.access_token != expired_access => {
                            let fresh = TokenInspector::decode(&current.access_token)
                                .is_ok_and(|d| !d.is_expired_at(Utc::now().timestamp()));
                            if fresh {
                                debug!("Access token replaced while waiting, skipping refresh");
                                return SessionState::Valid;
                            }
                            current.refresh_token
                        }
                        Ok(Some(_)) | Err(_) => refresh_token,
                        Ok(None) => {
                            debug!("Credentials cleared while waiting, skipping refresh");
                            return SessionState::NoCredentials;
                        }
                    };

                    let pending = Self::exchange(
                        Arc::clone(&self.store),
                        Arc::clone(&self.refresher),
                        Arc::clone(&self.inflight),
                        refresh_token,
                    )
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Runs one refresh exchange and frees the in-flight slot afterwards.
    async fn exchange(
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        inflight: Arc<Mutex<Option<InflightRefresh>>>,
        refresh_token: String,
    ) -> SessionState {
        let state = match refresher.refresh(&refresh_token).await {
            Ok(_) if !Self::still_holds(store.as_ref(), &refresh_token) => {
                info!("Session ended during refresh, discarding tokens");
                SessionState::NoCredentials
            }
            Ok(response) => match Credentials::apply_refresh(store.as_ref(), &response) {
                Ok(()) => {
                    info!(
                        rotated = response.refresh_token.is_some(),
                        "Session refreshed"
                    );
                    SessionState::Valid
                }
                Err(e) => {
                    error!(error = %e, "Failed to store refreshed credentials");
                    SessionState::RefreshFailed
                }
            },
            Err(e @ RefreshError::Rejected { .. }) => {
                warn!(error = %e, "Refresh token rejected");
                SessionState::RefreshFailed
            }
            Err(e @ RefreshError::Transport(_)) => {
                error!(error = %e, "Refresh exchange failed");
                SessionState::RefreshFailed
            }
        };

        inflight.lock().await.take();
        state
    }

    /// Whether the store still carries the refresh token that was exchanged.
    /// A logout or a new login while the exchange ran makes this false.
    fn still_holds(store: &dyn CredentialStore, refresh_token: &str) -> bool {
        matches!(
            Credentials::load(store),
            Ok(Some(current)) if current.refresh_token == refresh_token
        )
    }
}
