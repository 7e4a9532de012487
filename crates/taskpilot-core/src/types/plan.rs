//! Day plans and the time logs scheduled inside them.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::serde_util::null_as_default;
use crate::error::AppError;

/// Body of `POST /plans/` and `DELETE /plans/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlanRequest {
    /// Calendar day the plan belongs to.
    pub date: NaiveDate,
}

/// The plan of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub times: Vec<TimeLog>,
}

impl DayPlan {
    /// Total planned minutes across all time logs of the day.
    pub fn planned_minutes(&self) -> i64 {
        self.times.iter().map(TimeLog::duration_minutes).sum()
    }
}

/// Description of the task a time log points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescription {
    pub description: String,
}

/// A block of time reserved for a task inside a day plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLog {
    pub id: i64,
    pub task_id: i64,
    pub plan_id: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub task: Option<TaskDescription>,
}

impl TimeLog {
    /// Length of the block in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Description of the linked task, if the backend embedded it.
    pub fn task_description(&self) -> Option<&str> {
        self.task.as_ref().map(|t| t.description.as_str())
    }
}

/// Payload for `POST /plans/timelog`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimeLog {
    pub task_id: i64,
    pub plan_id: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl NewTimeLog {
    /// Rejects empty or inverted intervals before they reach the backend.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.end_time <= self.start_time {
            return Err(AppError::validation("end_time must be after start_time"));
        }
        Ok(())
    }
}

/// Renders a minute count as `"{h}h {m}m"`.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_day_plan_from_backend_json() {
        let plan: DayPlan = serde_json::from_value(serde_json::json!({
            "id": 12,
            "date": "2025-07-20",
            "times": [
                {
                    "id": 1, "task_id": 3, "plan_id": 12,
                    "start_time": "08:00:00", "end_time": "10:00:00",
                    "done": false, "task": { "description": "Fix bug #432" }
                },
                {
                    "id": 2, "task_id": 4, "plan_id": 12,
                    "start_time": "14:00:00", "end_time": "15:30:00",
                    "done": true, "task": null
                }
            ]
        }))
        .unwrap();

        assert_eq!(plan.times.len(), 2);
        assert_eq!(plan.times[0].task_description(), Some("Fix bug #432"));
        assert_eq!(plan.planned_minutes(), 210);
    }

    #[test]
    fn test_null_times_is_empty() {
        let plan: DayPlan =
            serde_json::from_str(r#"{"id": 1, "date": "2025-07-21", "times": null}"#).unwrap();
        assert!(plan.times.is_empty());
    }

    #[test]
    fn test_time_log_validation() {
        let mut log = NewTimeLog {
            task_id: 1,
            plan_id: 1,
            start_time: time(9, 0),
            end_time: time(12, 0),
        };
        assert!(log.validate().is_ok());
        log.end_time = time(9, 0);
        assert!(log.validate().is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(150), "2h 30m");
        assert_eq!(format_duration(45), "0h 45m");
        assert_eq!(format_duration(-5), "0h 0m");
    }
}
