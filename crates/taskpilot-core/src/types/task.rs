//! Task payloads.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_util::{datetime, null_as_default};
use crate::error::AppError;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Currently being worked on.
    InProgress,
    /// Finished.
    Completed,
    /// Paused by the owner.
    Stopped,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "stopped" => Ok(Self::Stopped),
            other => Err(AppError::validation(format!("Unknown task status: {other}"))),
        }
    }
}

/// A task as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Backend identifier.
    pub id: i64,
    /// Free-text description.
    pub description: String,
    /// Planned start.
    #[serde(default, with = "datetime::option")]
    pub start_date: Option<DateTime<Utc>>,
    /// Deadline.
    #[serde(with = "datetime")]
    pub end_date: DateTime<Utc>,
    /// Estimated effort in hours.
    pub estimated_hr: f64,
    /// Hours logged so far.
    #[serde(default)]
    pub done_hr: f64,
    /// Whether the task recurs. The wire name keeps the backend's spelling.
    #[serde(default, rename = "is_repititive")]
    pub is_repetitive: bool,
    /// Current status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Set while the task is paused.
    #[serde(default)]
    pub is_stopped: bool,
    /// Parent task for subtasks.
    #[serde(default)]
    pub main_task_id: Option<i64>,
    /// Identifiers of the subtasks.
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtasks: Vec<i64>,
    /// Identifiers of assigned users.
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignees: Vec<i64>,
    /// Owner user identifier.
    #[serde(default)]
    pub owner_id: Option<i64>,
}

/// Payload for creating a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    /// Free-text description.
    pub description: String,
    /// Planned start.
    #[serde(default, with = "datetime::option")]
    pub start_date: Option<DateTime<Utc>>,
    /// Deadline.
    #[serde(with = "datetime")]
    pub end_date: DateTime<Utc>,
    /// Estimated effort in hours.
    pub estimated_hr: f64,
    /// Whether the task recurs.
    #[serde(default, rename = "is_repititive")]
    pub is_repetitive: bool,
    /// Initial status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Parent task for subtasks.
    #[serde(default)]
    pub main_task_id: Option<i64>,
}

impl NewTask {
    /// Checks the payload before it is sent.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.description.trim().is_empty() {
            return Err(AppError::validation("Task description must not be empty"));
        }
        if !self.estimated_hr.is_finite() || self.estimated_hr < 0.0 {
            return Err(AppError::validation(
                "Estimated hours must be a non-negative number",
            ));
        }
        if let Some(start) = self.start_date {
            if self.end_date < start {
                return Err(AppError::validation("End date must not precede start date"));
            }
        }
        Ok(())
    }
}

/// Partial update of a task. Unset fields are omitted from the request.
///
/// `done_hr` is server-maintained and deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "datetime::option"
    )]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "datetime::option"
    )]
    pub end_date: Option<DateTime<Utc>>,
    /// Whole hours. The update endpoint accepts integers only, unlike creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hr: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "is_repititive"
    )]
    pub is_repetitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_task_id: Option<i64>,
}

impl TaskUpdate {
    /// Whether the update would send an empty body.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Listing parameters for `GET /tasks/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Substring filter on the description.
    pub search_name: Option<String>,
    /// Number of tasks to skip.
    pub skip: u32,
    /// Maximum number of tasks to return.
    pub limit: u32,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            search_name: None,
            skip: 0,
            limit: 10,
        }
    }
}

impl TaskQuery {
    /// Query pairs in the order the backend documents them.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = &self.search_name {
            pairs.push(("search_name", search.clone()));
        }
        pairs
    }
}

/// One progress sample of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub task_id: i64,
    #[serde(with = "datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "datetime")]
    pub end_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub done_hr: f64,
    pub estimated_hr: f64,
}

impl TaskProgress {
    /// Completion ratio clamped to `0.0..=1.0`. Zero estimates count as done.
    pub fn completion(&self) -> f64 {
        if self.estimated_hr <= 0.0 {
            return 1.0;
        }
        (self.done_hr / self.estimated_hr).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_task_from_backend_json() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": 3,
            "description": "Write documentation",
            "start_date": null,
            "end_date": "2025-07-22T13:30:00",
            "estimated_hr": 2.5,
            "done_hr": 1.0,
            "is_repititive": true,
            "status": "in_progress",
            "main_task_id": null,
            "subtasks": null,
            "assignees": [4, 5],
            "owner_id": 1
        }))
        .unwrap();

        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.is_repetitive);
        assert!(task.subtasks.is_empty());
        assert_eq!(task.assignees, vec![4, 5]);
        assert_eq!(
            task.end_date,
            Utc.with_ymd_and_hms(2025, 7, 22, 13, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_update_omits_unset_fields() {
        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "completed" }));
        assert!(!update.is_empty());
        assert!(TaskUpdate::default().is_empty());
    }

    #[test]
    fn test_update_sends_whole_hour_estimate() {
        let update = TaskUpdate {
            estimated_hr: Some(3),
            ..Default::default()
        };
        let body = serde_json::to_string(&update).unwrap();
        assert_eq!(body, r#"{"estimated_hr":3}"#);

        let err = serde_json::from_str::<TaskUpdate>(r#"{"estimated_hr": 2.5}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_new_task_validation() {
        let mut task = NewTask {
            description: "Fix bug #432".to_string(),
            start_date: Some(Utc.with_ymd_and_hms(2025, 7, 20, 8, 0, 0).unwrap()),
            end_date: Utc.with_ymd_and_hms(2025, 7, 20, 10, 0, 0).unwrap(),
            estimated_hr: 2.0,
            is_repetitive: false,
            status: TaskStatus::Pending,
            main_task_id: None,
        };
        assert!(task.validate().is_ok());

        task.end_date = Utc.with_ymd_and_hms(2025, 7, 19, 10, 0, 0).unwrap();
        assert!(task.validate().is_err());

        task.end_date = Utc.with_ymd_and_hms(2025, 7, 21, 10, 0, 0).unwrap();
        task.description = "   ".to_string();
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("Stopped".parse::<TaskStatus>().unwrap(), TaskStatus::Stopped);
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_query_pairs() {
        let query = TaskQuery {
            search_name: Some("bug".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("skip", "0".to_string()),
                ("limit", "10".to_string()),
                ("search_name", "bug".to_string()),
            ]
        );
    }

    #[test]
    fn test_progress_completion() {
        let sample = TaskProgress {
            task_id: 1,
            start_date: Utc::now(),
            end_date: Utc::now(),
            status: TaskStatus::InProgress,
            done_hr: 3.0,
            estimated_hr: 2.0,
        };
        assert_eq!(sample.completion(), 1.0);
    }
}
