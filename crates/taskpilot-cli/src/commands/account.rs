//! Account and session commands.

use chrono::Utc;
use clap::Args;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use taskpilot_auth::{Credentials, TokenInspector};
use taskpilot_client::TaskPilotClient;
use taskpilot_core::error::AppError;

/// Arguments for `login`
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    pub email: String,
    /// Password (prompted for when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

/// Arguments for `register`
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Display name
    pub username: String,
    /// Account email
    pub email: String,
    /// Password (prompted for when omitted)
    #[arg(long)]
    pub password: Option<String>,
    /// Log in right after registering
    #[arg(long)]
    pub login: bool,
}

/// Arguments for `logout`
#[derive(Debug, Args)]
pub struct LogoutArgs {
    /// Skip confirmation
    #[arg(long)]
    pub force: bool,
}

/// Session summary printed by `status`
#[derive(Debug, Serialize)]
struct SessionStatus {
    state: String,
    authorized: bool,
    subject: Option<String>,
    expires_at: Option<String>,
    remaining_seconds: Option<u64>,
}

pub async fn login(client: &TaskPilotClient, args: &LoginArgs) -> Result<(), AppError> {
    let password = password_or_prompt(args.password.as_deref(), false)?;
    client.auth.login(&args.email, &password).await?;
    output::print_success(&format!("Logged in as {}", args.email));
    Ok(())
}

pub async fn register(client: &TaskPilotClient, args: &RegisterArgs) -> Result<(), AppError> {
    let password = password_or_prompt(args.password.as_deref(), true)?;
    client
        .auth
        .register(&args.username, &args.email, &password)
        .await?;
    output::print_success(&format!("Account '{}' created", args.username));

    if args.login {
        client.auth.login(&args.email, &password).await?;
        output::print_success(&format!("Logged in as {}", args.email));
    } else {
        println!("Check {} for a verification link.", args.email);
    }
    Ok(())
}

pub fn logout(client: &TaskPilotClient, args: &LogoutArgs) -> Result<(), AppError> {
    if !super::confirm("Forget the stored session?", args.force)? {
        println!("Cancelled.");
        return Ok(());
    }
    client.auth.logout()?;
    output::print_success("Logged out");
    Ok(())
}

pub async fn verify_email(client: &TaskPilotClient, token: &str) -> Result<(), AppError> {
    client.auth.verify_email(token).await?;
    output::print_success("Email verified, you can log in now");
    Ok(())
}

pub async fn forgot_password(client: &TaskPilotClient, email: &str) -> Result<(), AppError> {
    client.auth.forgot_password(email).await?;
    output::print_success("Password reset link sent to your email");
    Ok(())
}

pub async fn reset_password(client: &TaskPilotClient, token: &str) -> Result<(), AppError> {
    let password = password_or_prompt(None, true)?;
    client.auth.reset_password(token, &password).await?;
    output::print_success("Your password has been reset, you can now log in");
    Ok(())
}

/// Evaluates the session (refreshing it if needed) and reports the result.
pub async fn status(client: &TaskPilotClient, format: OutputFormat) -> Result<(), AppError> {
    let state = client.authorizer.evaluate().await;
    let decoded = Credentials::load(client.store.as_ref())?
        .and_then(|c| TokenInspector::decode(&c.access_token).ok());
    let now = Utc::now().timestamp();

    let status = SessionStatus {
        state: state.to_string(),
        authorized: state.is_authorized(),
        subject: decoded.as_ref().and_then(|d| d.subject().map(str::to_string)),
        expires_at: decoded
            .as_ref()
            .and_then(|d| d.expires_at())
            .map(|at| at.to_rfc3339()),
        remaining_seconds: decoded.as_ref().map(|d| d.remaining_seconds(now)),
    };

    match format {
        OutputFormat::Json => output::print_json(&status),
        OutputFormat::Table => {
            output::print_kv("Session", &status.state);
            if let Some(subject) = &status.subject {
                output::print_kv("User", subject);
            }
            if let Some(expires_at) = &status.expires_at {
                output::print_kv("Access expires", expires_at);
            }
            if !status.authorized {
                output::print_warning("Run `taskpilot login <email>` to start a session");
            }
        }
    }
    Ok(())
}

fn password_or_prompt(given: Option<&str>, confirm: bool) -> Result<String, AppError> {
    if let Some(password) = given {
        return Ok(password.to_string());
    }

    let mut prompt = dialoguer::Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Repeat password", "Passwords do not match");
    }
    prompt
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}
