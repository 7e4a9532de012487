//! Resource controllers.
//!
//! Every operation asks the session authorizer first. When the session is
//! not usable the controller records a redirect to the login route and
//! fails without touching the network; otherwise it performs exactly one
//! backend call and folds the outcome into its observable state.

pub mod plan;
pub mod task;
pub mod timelog;

pub use plan::PlanController;
pub use task::TaskController;
pub use timelog::TimeLogController;

use tokio::sync::watch;
use tracing::{debug, warn};

use taskpilot_auth::SessionAuthorizer;
use taskpilot_core::error::AppError;
use taskpilot_core::result::AppResult;

use crate::dispatcher::RequestDispatcher;

/// Local view of a resource collection.
#[derive(Debug, Clone)]
pub struct ResourceState<T> {
    /// Items as last confirmed by the backend (or optimistically applied).
    pub items: Vec<T>,
    /// Most recent failure, cleared by the next success.
    pub error: Option<AppError>,
    /// Route the user must be sent to before anything else works.
    pub redirect: Option<String>,
    /// A backend call is in flight.
    pub loading: bool,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
            redirect: None,
            loading: false,
        }
    }
}

/// Plumbing shared by the concrete controllers.
#[derive(Debug)]
pub(crate) struct ControllerCore<T> {
    pub(crate) dispatcher: RequestDispatcher,
    authorizer: SessionAuthorizer,
    login_route: String,
    state: watch::Sender<ResourceState<T>>,
}

impl<T: Clone> ControllerCore<T> {
    pub(crate) fn new(
        dispatcher: RequestDispatcher,
        authorizer: SessionAuthorizer,
        login_route: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            dispatcher,
            authorizer,
            login_route: login_route.into(),
            state,
        }
    }

    pub(crate) fn snapshot(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.subscribe()
    }

    /// Applies `f` to the state. Works with or without live observers.
    pub(crate) fn update(&self, f: impl FnOnce(&mut ResourceState<T>)) {
        self.state.send_modify(f);
    }

    /// Gate run before every backend call.
    pub(crate) async fn authorize(&self, operation: &'static str) -> AppResult<()> {
        if self.authorizer.ensure_authorized().await {
            self.update(|s| {
                s.redirect = None;
                s.loading = true;
            });
            return Ok(());
        }

        debug!(operation, login_route = %self.login_route, "Operation blocked, session not authorized");
        let login_route = self.login_route.clone();
        self.update(|s| s.redirect = Some(login_route));
        Err(AppError::authentication(format!(
            "Login required before {operation}"
        )))
    }

    /// Records a local failure that never reached the backend.
    pub(crate) fn reject(&self, err: AppError) -> AppError {
        let recorded = err.clone();
        self.update(|s| s.error = Some(recorded));
        err
    }

    /// Folds the outcome of a backend call into the state and hands it back.
    ///
    /// A 401 from the backend means the session died between the check and
    /// the call, so it also records the login redirect.
    pub(crate) fn settle<R>(&self, operation: &'static str, result: AppResult<R>) -> AppResult<R> {
        match &result {
            Ok(_) => self.update(|s| {
                s.loading = false;
                s.error = None;
            }),
            Err(e) => {
                warn!(operation, error = %e, "Backend operation failed");
                let recorded = e.clone();
                let redirect = e.is_authentication().then(|| self.login_route.clone());
                self.update(|s| {
                    s.loading = false;
                    s.error = Some(recorded);
                    if redirect.is_some() {
                        s.redirect = redirect;
                    }
                });
            }
        }
        result
    }
}

/// Replaces the item matching `same` or appends `item`.
pub(crate) fn upsert<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T) -> bool) {
    match items.iter_mut().find(|existing| same(existing)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}
