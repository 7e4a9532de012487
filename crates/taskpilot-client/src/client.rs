//! Wires the dispatcher, session handling and controllers together.

use std::sync::Arc;

use tracing::info;

use taskpilot_auth::{FileCredentialStore, RouteGuard, SessionAuthorizer};
use taskpilot_core::config::ClientConfig;
use taskpilot_core::result::AppResult;
use taskpilot_core::traits::CredentialStore;

use crate::auth_api::AuthApi;
use crate::controller::{PlanController, TaskController, TimeLogController};
use crate::dispatcher::RequestDispatcher;

/// Everything a front end needs to talk to the backend.
///
/// All parts share one credential store and one session authorizer, so a
/// refresh triggered by any of them is visible to the others.
#[derive(Debug)]
pub struct TaskPilotClient {
    pub store: Arc<dyn CredentialStore>,
    pub auth: AuthApi,
    pub authorizer: SessionAuthorizer,
    pub guard: RouteGuard,
    pub tasks: TaskController,
    pub plans: PlanController,
    pub timelogs: TimeLogController,
}

impl TaskPilotClient {
    /// Builds the client around an existing credential store.
    pub fn new(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> AppResult<Self> {
        let dispatcher = RequestDispatcher::new(&config.api, store.clone())?;
        let auth = AuthApi::new(dispatcher.clone());
        let authorizer = SessionAuthorizer::new(store.clone(), Arc::new(auth.clone()));
        let login_route = config.session.login_route.as_str();

        info!(base_url = %dispatcher.base_url(), "TaskPilot client ready");

        Ok(Self {
            guard: RouteGuard::new(authorizer.clone(), login_route),
            tasks: TaskController::new(dispatcher.clone(), authorizer.clone(), login_route),
            plans: PlanController::new(dispatcher.clone(), authorizer.clone(), login_route),
            timelogs: TimeLogController::new(dispatcher, authorizer.clone(), login_route),
            store,
            auth,
            authorizer,
        })
    }

    /// Builds the client with the credential file named in the configuration.
    pub fn from_config(config: &ClientConfig) -> AppResult<Self> {
        let store = FileCredentialStore::open(&config.credentials.path)?;
        Self::new(config, Arc::new(store))
    }
}
