//! Task CLI commands.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use taskpilot_client::TaskPilotClient;
use taskpilot_core::error::AppError;
use taskpilot_core::types::{NewTask, Task, TaskProgress, TaskQuery, TaskStatus, TaskUpdate};

/// Arguments for task commands
#[derive(Debug, Args)]
pub struct TaskArgs {
    /// Task subcommand
    #[command(subcommand)]
    pub command: TaskCommand,
}

/// Task subcommands
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// List tasks
    List {
        /// Only tasks whose description contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Tasks to skip
        #[arg(long, default_value_t = 0)]
        skip: u32,
        /// Maximum number of tasks
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Show one task
    Get {
        /// Task ID
        id: i64,
    },
    /// Create a task
    Create {
        /// What needs doing
        description: String,
        /// Deadline (`YYYY-MM-DD`, `YYYY-MM-DD HH:MM` or RFC 3339)
        #[arg(long, value_parser = parse_datetime)]
        due: DateTime<Utc>,
        /// Planned start, same formats as `--due`
        #[arg(long, value_parser = parse_datetime)]
        start: Option<DateTime<Utc>>,
        /// Estimated effort in hours
        #[arg(long, default_value_t = 1.0)]
        estimate: f64,
        /// Task recurs
        #[arg(long)]
        repeat: bool,
        /// Parent task for a subtask
        #[arg(long)]
        parent: Option<i64>,
    },
    /// Change fields of a task
    Update {
        /// Task ID
        id: i64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_datetime)]
        due: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_datetime)]
        start: Option<DateTime<Utc>>,
        /// Whole hours
        #[arg(long)]
        estimate: Option<u32>,
        #[arg(long)]
        repeat: Option<bool>,
        /// pending, in-progress, completed or stopped
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Share a task with another user
    Assign {
        /// Task ID
        id: i64,
        /// Email of the assignee
        email: String,
    },
    /// Start working on a task
    Start {
        /// Task ID
        id: i64,
    },
    /// Pause a task
    Stop {
        /// Task ID
        id: i64,
    },
    /// Show progress samples of a task
    Progress {
        /// Task ID
        id: i64,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Show analytics of a task
    Analytics {
        /// Task ID
        id: i64,
    },
}

/// Task display row for table output
#[derive(Debug, Serialize, Tabled)]
struct TaskRow {
    /// Task ID
    id: i64,
    /// Description
    description: String,
    /// Status
    status: String,
    /// Deadline
    due: String,
    /// Logged / estimated hours
    hours: String,
    /// Recurs
    repeats: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            description: task.description.clone(),
            status: task.status.to_string(),
            due: task.end_date.format("%Y-%m-%d %H:%M").to_string(),
            hours: format!("{:.1} / {:.1}", task.done_hr, task.estimated_hr),
            repeats: if task.is_repetitive { "✓" } else { "" }.to_string(),
        }
    }
}

/// Progress sample row
#[derive(Debug, Serialize, Tabled)]
struct ProgressRow {
    /// Window start
    from: String,
    /// Window end
    to: String,
    /// Status
    status: String,
    /// Completion
    done: String,
}

impl From<&TaskProgress> for ProgressRow {
    fn from(sample: &TaskProgress) -> Self {
        Self {
            from: sample.start_date.format("%Y-%m-%d %H:%M").to_string(),
            to: sample.end_date.format("%Y-%m-%d %H:%M").to_string(),
            status: sample.status.to_string(),
            done: format!("{:.0}%", sample.completion() * 100.0),
        }
    }
}

/// Execute task commands
pub async fn execute(
    client: &TaskPilotClient,
    args: &TaskArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let tasks = &client.tasks;

    match &args.command {
        TaskCommand::List {
            search,
            skip,
            limit,
        } => {
            let query = TaskQuery {
                search_name: search.clone(),
                skip: *skip,
                limit: *limit,
            };
            super::guarded(client, || async {
                let found = tasks.fetch_all(&query).await?;
                let rows: Vec<TaskRow> = found.iter().map(TaskRow::from).collect();
                output::print_list(&rows, format);
                Ok(())
            })
            .await
        }
        TaskCommand::Get { id } => {
            super::guarded(client, || async {
                let task = tasks.get(*id).await?;
                print_task(&task, format);
                Ok(())
            })
            .await
        }
        TaskCommand::Create {
            description,
            due,
            start,
            estimate,
            repeat,
            parent,
        } => {
            let new_task = NewTask {
                description: description.clone(),
                start_date: *start,
                end_date: *due,
                estimated_hr: *estimate,
                is_repetitive: *repeat,
                status: TaskStatus::Pending,
                main_task_id: *parent,
            };
            new_task.validate()?;
            super::guarded(client, || async {
                let created = tasks.create(&new_task).await?;
                output::print_success(&format!("Task {} created", created.id));
                print_task(&created, format);
                Ok(())
            })
            .await
        }
        TaskCommand::Update {
            id,
            description,
            due,
            start,
            estimate,
            repeat,
            status,
        } => {
            let update = TaskUpdate {
                description: description.clone(),
                start_date: *start,
                end_date: *due,
                estimated_hr: *estimate,
                is_repetitive: *repeat,
                status: *status,
                main_task_id: None,
            };
            if update.is_empty() {
                return Err(AppError::validation("Pass at least one field to change"));
            }
            super::guarded(client, || async {
                let updated = tasks.update(*id, &update).await?;
                output::print_success(&format!("Task {id} updated"));
                print_task(&updated, format);
                Ok(())
            })
            .await
        }
        TaskCommand::Delete { id, force } => {
            if !super::confirm(&format!("Delete task {id}?"), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            super::guarded(client, || async {
                tasks.delete(*id).await?;
                output::print_success(&format!("Task {id} deleted"));
                Ok(())
            })
            .await
        }
        TaskCommand::Assign { id, email } => {
            super::guarded(client, || async {
                tasks.assign(*id, email).await?;
                output::print_success(&format!("Task {id} assigned to {email}"));
                Ok(())
            })
            .await
        }
        TaskCommand::Start { id } => {
            super::guarded(client, || async {
                tasks.start(*id).await?;
                output::print_success(&format!("Task {id} started"));
                Ok(())
            })
            .await
        }
        TaskCommand::Stop { id } => {
            super::guarded(client, || async {
                tasks.stop(*id).await?;
                output::print_success(&format!("Task {id} stopped"));
                Ok(())
            })
            .await
        }
        TaskCommand::Progress { id, skip, limit } => {
            super::guarded(client, || async {
                let samples = tasks.progress(*id, *skip, *limit).await?;
                let rows: Vec<ProgressRow> = samples.iter().map(ProgressRow::from).collect();
                output::print_list(&rows, format);
                Ok(())
            })
            .await
        }
        TaskCommand::Analytics { id } => {
            super::guarded(client, || async {
                let analytics = tasks.analytics(*id).await?;
                output::print_json(&analytics);
                Ok(())
            })
            .await
        }
    }
}

fn print_task(task: &Task, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(task),
        OutputFormat::Table => {
            output::print_kv("ID", &task.id.to_string());
            output::print_kv("Description", &task.description);
            output::print_kv("Status", &task.status.to_string());
            if let Some(start) = task.start_date {
                output::print_kv("Start", &start.format("%Y-%m-%d %H:%M").to_string());
            }
            output::print_kv("Due", &task.end_date.format("%Y-%m-%d %H:%M").to_string());
            output::print_kv(
                "Hours",
                &format!("{:.1} of {:.1}", task.done_hr, task.estimated_hr),
            );
            if !task.subtasks.is_empty() {
                let ids: Vec<String> = task.subtasks.iter().map(i64::to_string).collect();
                output::print_kv("Subtasks", &ids.join(", "));
            }
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` (UTC) or a bare date (midnight UTC).
fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Ok(at.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| format!("'{raw}' is not a date or date-time"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 7, 22, 13, 30, 0).unwrap();
        assert_eq!(parse_datetime("2025-07-22T13:30:00Z").unwrap(), expected);
        assert_eq!(parse_datetime("2025-07-22 13:30").unwrap(), expected);
        assert_eq!(
            parse_datetime("2025-07-22").unwrap(),
            Utc.with_ymd_and_hms(2025, 7, 22, 0, 0, 0).unwrap()
        );
        assert!(parse_datetime("next tuesday").is_err());
    }
}
