//! # taskpilot-client
//!
//! Talks to the TaskPilot backend on behalf of an authorized session.
//!
//! - [`RequestDispatcher`] attaches the stored bearer token to every request.
//! - [`AuthApi`] covers login, registration, the one-shot account flows and
//!   the refresh exchange used by the session authorizer.
//! - The controllers gate every operation on the session authorizer and keep
//!   an observable copy of what the backend returned.
//! - [`TaskPilotClient`] wires all of it together from configuration.

pub mod auth_api;
pub mod client;
pub mod controller;
pub mod dispatcher;

pub use auth_api::AuthApi;
pub use client::TaskPilotClient;
pub use controller::{PlanController, ResourceState, TaskController, TimeLogController};
pub use dispatcher::RequestDispatcher;
