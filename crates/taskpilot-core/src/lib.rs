//! # taskpilot-core
//!
//! Core crate for the TaskPilot client. Contains configuration schemas,
//! the task/plan/time-log domain types exchanged with the backend,
//! the credential store trait, and the unified error system.
//!
//! This crate has **no** internal dependencies on other TaskPilot crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
