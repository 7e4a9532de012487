//! Route guard: blocks protected views until the session is authorized.

use std::future::Future;

use tokio::sync::watch;
use tracing::debug;

use crate::session::SessionAuthorizer;

/// Authorization progress of one mounted route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardState {
    /// The authorization check is running; show a loading indicator.
    Pending,
    /// The check passed; the protected view was rendered.
    Authorized,
    /// The check failed; the user was sent to the login route.
    Unauthorized,
}

impl GuardState {
    /// Whether the mount has reached a final decision.
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

/// What to show once the guard has decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation<T> {
    /// Show the protected view.
    Render(T),
    /// Go to this route instead.
    Redirect(String),
}

impl<T> Navigation<T> {
    /// The rendered view, if any.
    pub fn into_view(self) -> Option<T> {
        match self {
            Self::Render(view) => Some(view),
            Self::Redirect(_) => None,
        }
    }

    /// The redirect target, if any.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Render(_) => None,
            Self::Redirect(route) => Some(route),
        }
    }
}

/// Gates protected views on [`SessionAuthorizer::ensure_authorized`].
#[derive(Debug, Clone)]
pub struct RouteGuard {
    authorizer: SessionAuthorizer,
    login_route: String,
}

impl RouteGuard {
    /// Creates a guard redirecting to `login_route` on failure.
    pub fn new(authorizer: SessionAuthorizer, login_route: impl Into<String>) -> Self {
        Self {
            authorizer,
            login_route: login_route.into(),
        }
    }

    /// Entry point unauthenticated users are sent to.
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Starts a new mount in [`GuardState::Pending`].
    ///
    /// Nothing is carried over from earlier mounts.
    pub fn mount(&self) -> GuardedRoute {
        let (state, _) = watch::channel(GuardState::Pending);
        GuardedRoute {
            authorizer: self.authorizer.clone(),
            login_route: self.login_route.clone(),
            state,
        }
    }

    /// Mounts and resolves in one step.
    pub async fn protect<T, F, Fut>(&self, render: F) -> Navigation<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.mount().resolve(render).await
    }
}

/// One mount of a protected route.
#[derive(Debug)]
pub struct GuardedRoute {
    authorizer: SessionAuthorizer,
    login_route: String,
    state: watch::Sender<GuardState>,
}

impl GuardedRoute {
    /// Current state of this mount.
    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    /// Observes state changes, e.g. to drive a loading indicator.
    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    /// Runs the authorization check, then renders or redirects.
    ///
    /// Consumes the mount: the decision is final for its lifetime.
    pub async fn resolve<T, F, Fut>(self, render: F) -> Navigation<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self.authorizer.ensure_authorized().await {
            self.state.send_replace(GuardState::Authorized);
            Navigation::Render(render().await)
        } else {
            debug!(login_route = %self.login_route, "Redirecting unauthenticated user");
            self.state.send_replace(GuardState::Unauthorized);
            Navigation::Redirect(self.login_route)
        }
    }
}
