//! Convenience result type alias for TaskPilot.

use crate::error::AppError;

/// A specialized `Result` type for TaskPilot operations.
pub type AppResult<T> = Result<T, AppError>;
