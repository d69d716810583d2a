//! woc - command-line client for the Winter of Code contest.
//!
//! Logs in, links a GitHub account, and shows the hall of fame and team
//! from the contest backend. The session is kept between runs, encrypted,
//! with its key in the OS keychain.

mod commands;
mod format;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use woc_core::api::{Executor, ReqwestTransport};
use woc_core::auth::{CredentialStore, SessionContext, SessionStore};
use woc_core::{Config, WocClient};

use commands::{Command, StderrNotifier};

/// Log file name prefix when logging to a directory
const LOG_FILE_PREFIX: &str = "woc.log";

#[derive(Debug, Parser)]
#[command(name = "woc", version, about = "Winter of Code command-line client")]
struct Cli {
    /// Backend root URL (overrides WOC_BACKEND_URL and the config file)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Write logs to daily files in this directory instead of stderr
    #[arg(long, global = true, env = "WOC_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_deref());

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    // Without a keychain the session still works for this run, it just isn't kept
    let store = match CredentialStore::session_cipher() {
        Ok(cipher) => Some(SessionStore::new(config.data_dir()?, cipher)),
        Err(e) => {
            warn!(error = %e, "Session will not be persisted");
            None
        }
    };
    let session = store
        .as_ref()
        .map(|s| s.restore())
        .unwrap_or_else(SessionContext::new);

    let backend_url = config.backend_url(cli.backend_url.as_deref());
    info!(backend = %backend_url, "woc starting");

    let transport = ReqwestTransport::with_timeout(config.request_timeout())?;
    let executor = Executor::with_notifier(transport, session, &backend_url, StderrNotifier);
    let client = WocClient::from_executor(executor, &backend_url);

    let result = commands::run(cli.command, &client, &mut config).await;

    // Refreshed tokens and logouts are written back even when the command failed
    if let Some(store) = &store {
        if let Err(e) = store.persist(client.session()).await {
            warn!(error = %e, "Failed to save session");
        }
    }

    Ok(if result? {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
