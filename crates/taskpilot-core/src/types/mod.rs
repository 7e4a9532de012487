//! Domain types exchanged with the TaskPilot backend.

pub mod auth;
pub mod plan;
pub mod serde_util;
pub mod task;

pub use auth::{
    AssignRequest, EmailRequest, LoginRequest, NewPasswordRequest, RefreshRequest,
    RefreshResponse, RegisterRequest, TokenPair, User,
};
pub use plan::{DayPlan, DayPlanRequest, NewTimeLog, TaskDescription, TimeLog, format_duration};
pub use task::{NewTask, Task, TaskProgress, TaskQuery, TaskStatus, TaskUpdate};
