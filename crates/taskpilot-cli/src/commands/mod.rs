//! CLI command definitions and dispatch.

pub mod account;
pub mod plan;
pub mod task;
pub mod timelog;

use std::future::Future;

use clap::{Parser, Subcommand};
use tokio::sync::watch;

use crate::output::{self, OutputFormat};
use taskpilot_auth::{GuardState, Navigation};
use taskpilot_client::TaskPilotClient;
use taskpilot_core::config::ClientConfig;
use taskpilot_core::error::AppError;

/// TaskPilot: plan your day around your tasks
#[derive(Debug, Parser)]
#[command(name = "taskpilot", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in and store the issued tokens
    Login(account::LoginArgs),
    /// Create an account
    Register(account::RegisterArgs),
    /// Forget the stored tokens
    Logout(account::LogoutArgs),
    /// Confirm an email address
    VerifyEmail {
        /// Token from the verification email
        token: String,
    },
    /// Request a password reset link
    ForgotPassword {
        /// Account email
        email: String,
    },
    /// Set a new password with a reset token
    ResetPassword {
        /// Token from the reset email
        token: String,
    },
    /// Show whether the stored session is usable
    Status,
    /// Task management
    Task(task::TaskArgs),
    /// Day plans
    Plan(plan::PlanArgs),
    /// Time blocks inside a day plan
    Timelog(timelog::TimeLogArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &ClientConfig) -> Result<(), AppError> {
        let client = TaskPilotClient::from_config(config)?;

        match &self.command {
            Commands::Login(args) => account::login(&client, args).await,
            Commands::Register(args) => account::register(&client, args).await,
            Commands::Logout(args) => account::logout(&client, args),
            Commands::VerifyEmail { token } => account::verify_email(&client, token).await,
            Commands::ForgotPassword { email } => account::forgot_password(&client, email).await,
            Commands::ResetPassword { token } => account::reset_password(&client, token).await,
            Commands::Status => account::status(&client, self.format).await,
            Commands::Task(args) => task::execute(&client, args, self.format).await,
            Commands::Plan(args) => plan::execute(&client, args, self.format).await,
            Commands::Timelog(args) => timelog::execute(&client, args, self.format).await,
        }
    }
}

/// Runs `render` behind the route guard.
///
/// Shows a pending line while the session is being checked and turns a
/// redirect into an authentication error telling the user to log in.
pub async fn guarded<F, Fut>(client: &TaskPilotClient, render: F) -> Result<(), AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), AppError>>,
{
    let route = client.guard.mount();
    let observer = route.subscribe();
    report_pending(&observer);

    match route.resolve(render).await {
        Navigation::Render(result) => result,
        Navigation::Redirect(target) => {
            output::print_warning(&format!("Not logged in (redirected to {target})"));
            Err(AppError::authentication(
                "Run `taskpilot login <email>` to start a session",
            ))
        }
    }
}

fn report_pending(observer: &watch::Receiver<GuardState>) {
    if !observer.borrow().is_terminal() {
        output::print_pending("Checking session");
    }
}

/// Asks for confirmation unless `force` is set.
pub fn confirm(prompt: &str, force: bool) -> Result<bool, AppError> {
    if force {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}
