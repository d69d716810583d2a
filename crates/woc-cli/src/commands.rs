//! Subcommand handlers.
//!
//! Handlers return `Ok(false)` for a failed outcome. The failure message has
//! already reached the user through the notifier, so nothing is printed twice.

use std::io::{self, Write};

use anyhow::{anyhow, Result};
use clap::Subcommand;
use tracing::warn;
use woc_core::api::{Notifier, Transport};
use woc_core::auth::CallbackOutcome;
use woc_core::models::TeamRoster;
use woc_core::{ApiError, Config, Outcome, WocClient};

use crate::format::{render_hall_of_fame, render_session, render_team};

/// Environment variable read for the password before prompting
const PASSWORD_ENV: &str = "WOC_PASSWORD";

const LOGIN_HINT: &str = "Run `woc login` to sign in again.";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Show the hall of fame
    Hof,
    /// Print the URL for linking a GitHub account
    Link,
    /// Complete GitHub linking from the redirect URL or its query string
    Callback { redirect: String },
    /// List the organising team
    Team {
        /// Path or URL of team.json
        #[arg(long)]
        source: Option<String>,
        /// Only members with one of these tags
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        shuffle: bool,
    },
    /// Hall of fame and team summary in one go
    Dashboard,
    /// Authenticated GET of a backend path, printed as JSON
    Get {
        path: String,
        /// Query parameter as key=value
        #[arg(long = "query", value_parser = parse_key_val)]
        query: Vec<(String, String)>,
    },
}

/// Prints failure notices to stderr
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("✗ {}", message);
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", s))?;
    if key.is_empty() {
        return Err(format!("empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn run<T: Transport, N: Notifier>(
    command: Command,
    client: &WocClient<T, N>,
    config: &mut Config,
) -> Result<bool> {
    match command {
        Command::Login { email } => login(client, config, email).await,
        Command::Logout => {
            if client.logout().await {
                println!("Logged out.");
            } else {
                println!("Not logged in.");
            }
            Ok(true)
        }
        Command::Whoami => match client.session().snapshot().await {
            Some(session) => {
                println!("{}", render_session(&session));
                Ok(true)
            }
            None => {
                println!("Not logged in.");
                Ok(false)
            }
        },
        Command::Hof => Ok(print_outcome(client.hall_of_fame().await, |hof| {
            render_hall_of_fame(&hof)
        })),
        Command::Link => Ok(print_outcome(client.github_authorize_url().await, |url| {
            format!("Open this URL to link your GitHub account:\n  {}", url)
        })),
        Command::Callback { redirect } => match client.accept_callback(&redirect).await {
            CallbackOutcome::Linked(_) => {
                println!("GitHub account linked successfully!");
                Ok(true)
            }
            CallbackOutcome::Failed => Ok(false),
            CallbackOutcome::Ignored => {
                println!("Callback carried no credentials; nothing changed.");
                Ok(true)
            }
        },
        Command::Team { source, tags, shuffle } => {
            let source = source
                .or_else(|| config.team_source.clone())
                .ok_or_else(|| anyhow!("No team source configured (use --source)"))?;
            Ok(print_outcome(client.team(&source).await, |roster| {
                let roster = if shuffle {
                    TeamRoster { team: roster.shuffled() }
                } else {
                    roster
                };
                render_team(&roster.filter_by_tags(&tags), &roster.unique_tags())
            }))
        }
        Command::Dashboard => dashboard(client, config).await,
        Command::Get { path, query } => {
            let outcome = client.get_json(&path, &query).await;
            Ok(print_outcome(outcome, |value| {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }))
        }
    }
}

fn print_outcome<P>(outcome: Outcome<P>, render: impl FnOnce(P) -> String) -> bool {
    match outcome {
        Outcome::Success(payload) => {
            println!("{}", render(payload));
            true
        }
        Outcome::Failure(e) => {
            if let Some(hint) = login_hint(&e) {
                eprintln!("  {}", hint);
            }
            false
        }
    }
}

fn login_hint(error: &ApiError) -> Option<&'static str> {
    error.requires_login().then_some(LOGIN_HINT)
}

async fn login<T: Transport, N: Notifier>(
    client: &WocClient<T, N>,
    config: &mut Config,
    email: Option<String>,
) -> Result<bool> {
    let email = match email {
        Some(email) => email,
        None => prompt_email(config.last_email.as_deref())?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ")?,
    };

    if email.is_empty() || password.is_empty() {
        eprintln!("✗ Email and password required");
        return Ok(false);
    }

    match client.login(&email, &password).await {
        Outcome::Success(session) => {
            config.last_email = Some(email);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Login successful! Signed in as {}", session.display_name());
            Ok(true)
        }
        Outcome::Failure(_) => Ok(false),
    }
}

fn prompt_email(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

async fn dashboard<T: Transport, N: Notifier>(
    client: &WocClient<T, N>,
    config: &Config,
) -> Result<bool> {
    match client.session().snapshot().await {
        Some(session) => println!("Signed in as {} ({} bounty)", session.display_name(), session.bounty),
        None => println!("Not logged in."),
    }

    let team = async {
        match config.team_source.as_deref() {
            Some(source) => Some(client.team(source).await),
            None => None,
        }
    };
    let (hof, team) = futures::join!(client.hall_of_fame(), team);

    println!();
    let mut ok = print_outcome(hof, |hof| render_hall_of_fame(&hof));
    if let Some(team) = team {
        println!();
        ok &= print_outcome(team, |roster| format!("Team: {} members", roster.team.len()));
    }
    Ok(ok)
}
