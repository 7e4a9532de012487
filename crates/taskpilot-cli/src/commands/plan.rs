//! Day plan CLI commands.

use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};

use super::timelog::TimeLogRow;
use crate::output::{self, OutputFormat};
use taskpilot_client::TaskPilotClient;
use taskpilot_core::error::AppError;
use taskpilot_core::types::format_duration;

/// Arguments for plan commands
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Plan subcommand
    #[command(subcommand)]
    pub command: PlanCommand,
}

/// Plan subcommands
#[derive(Debug, Subcommand)]
pub enum PlanCommand {
    /// Show the plan of a day, creating it if needed
    Show {
        /// Day as `YYYY-MM-DD` (defaults to today)
        date: Option<NaiveDate>,
    },
    /// Delete the plan of a day and its time blocks
    Delete {
        /// Day as `YYYY-MM-DD`
        date: NaiveDate,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

/// Execute plan commands
pub async fn execute(
    client: &TaskPilotClient,
    args: &PlanArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        PlanCommand::Show { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            super::guarded(client, || async {
                let plan = client.plans.load(date).await?;
                match format {
                    OutputFormat::Json => output::print_json(&plan),
                    OutputFormat::Table => {
                        println!("Plan {} for {}", plan.id, plan.date);
                        let rows: Vec<TimeLogRow> = plan.times.iter().map(TimeLogRow::from).collect();
                        output::print_list(&rows, format);
                        output::print_kv("Planned", &format_duration(plan.planned_minutes()));
                    }
                }
                Ok(())
            })
            .await
        }
        PlanCommand::Delete { date, force } => {
            if !super::confirm(&format!("Delete the plan for {date}?"), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            super::guarded(client, || async {
                let deleted = client.plans.delete(*date).await?;
                output::print_success(&format!(
                    "Plan for {} deleted ({} time blocks)",
                    deleted.date,
                    deleted.times.len()
                ));
                Ok(())
            })
            .await
        }
    }
}
