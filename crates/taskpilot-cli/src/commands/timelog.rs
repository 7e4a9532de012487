//! Time block CLI commands.

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use taskpilot_client::TaskPilotClient;
use taskpilot_core::error::AppError;
use taskpilot_core::types::{NewTimeLog, TimeLog, format_duration};

/// Arguments for time log commands
#[derive(Debug, Args)]
pub struct TimeLogArgs {
    /// Time log subcommand
    #[command(subcommand)]
    pub command: TimeLogCommand,
}

/// Time log subcommands
#[derive(Debug, Subcommand)]
pub enum TimeLogCommand {
    /// Reserve time for a task on a day
    Add {
        /// Day as `YYYY-MM-DD`
        date: NaiveDate,
        /// Task ID
        task_id: i64,
        /// Start as `HH:MM`
        #[arg(value_parser = parse_time)]
        start: NaiveTime,
        /// End as `HH:MM`
        #[arg(value_parser = parse_time)]
        end: NaiveTime,
    },
    /// Remove a time block
    Delete {
        /// Time log ID
        id: i64,
    },
}

/// Time block display row
#[derive(Debug, Serialize, Tabled)]
pub struct TimeLogRow {
    /// Time log ID
    id: i64,
    /// Interval
    time: String,
    /// Length
    length: String,
    /// Task
    task: String,
    /// Done
    done: String,
}

impl From<&TimeLog> for TimeLogRow {
    fn from(log: &TimeLog) -> Self {
        Self {
            id: log.id,
            time: format!(
                "{}-{}",
                log.start_time.format("%H:%M"),
                log.end_time.format("%H:%M")
            ),
            length: format_duration(log.duration_minutes()),
            task: log
                .task_description()
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", log.task_id)),
            done: if log.done { "✓" } else { "" }.to_string(),
        }
    }
}

/// Execute time log commands
pub async fn execute(
    client: &TaskPilotClient,
    args: &TimeLogArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let timelogs = &client.timelogs;

    match &args.command {
        TimeLogCommand::Add {
            date,
            task_id,
            start,
            end,
        } => {
            super::guarded(client, || async {
                let plan = timelogs.load_day(*date).await?;
                let created = timelogs
                    .create(&NewTimeLog {
                        task_id: *task_id,
                        plan_id: plan.id,
                        start_time: *start,
                        end_time: *end,
                    })
                    .await?;

                output::print_success(&format!("Time block {} added to {date}", created.id));
                let rows: Vec<TimeLogRow> = timelogs.state().items.iter().map(TimeLogRow::from).collect();
                output::print_list(&rows, format);
                Ok(())
            })
            .await
        }
        TimeLogCommand::Delete { id } => {
            super::guarded(client, || async {
                timelogs.delete(*id).await?;
                output::print_success(&format!("Time block {id} removed"));
                Ok(())
            })
            .await
        }
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("'{raw}' is not a time of day"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(parse_time("17:05:10").unwrap(), NaiveTime::from_hms_opt(17, 5, 10).unwrap());
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn test_row_falls_back_to_task_id() {
        let log = TimeLog {
            id: 4,
            task_id: 9,
            plan_id: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
            done: false,
            task: None,
        };
        let row = TimeLogRow::from(&log);
        assert_eq!(row.task, "#9");
        assert_eq!(row.time, "09:00-10:15");
    }
}
