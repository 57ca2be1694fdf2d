#![forbid(unsafe_code)]

//! Telegram approval bot server binary.
//!
//! Bootstraps configuration and credentials, opens the record store, and
//! serves the Telegram webhook until Ctrl-C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use ledger_bot::config::GlobalConfig;
use ledger_bot::persistence::db;
use ledger_bot::persistence::record_repo::RecordRepo;
use ledger_bot::server;
use ledger_bot::state::AppState;
use ledger_bot::telegram::client::TelegramClient;
use ledger_bot::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "ledger-bot", about = "Telegram approval bot", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Register the webhook and command menu with Telegram on start-up.
    #[arg(long)]
    register: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("ledger-bot server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!(
        admins = config.telegram.admin_chat_ids.len(),
        webhook_secret = config.telegram.webhook_secret.is_some(),
        "configuration loaded"
    );

    // ── Initialize database ─────────────────────────────
    let pool = Arc::new(db::connect(&config.database_path).await?);
    info!(path = %config.database_path.display(), "database connected");

    // ── Build shared application state ──────────────────
    let client = TelegramClient::from_config(&config.telegram, config.telegram_timeout())?;
    let state = Arc::new(AppState::new(
        Arc::clone(&config),
        Arc::new(client),
        Arc::new(RecordRepo::new(pool)),
    ));

    if args.register {
        let report = state
            .notifier
            .register(
                &config.telegram.webhook_url(),
                config.telegram.webhook_secret.as_deref(),
            )
            .await;
        if report.ok() {
            info!(webhook_url = %report.webhook_url, "webhook and command menu registered");
        } else {
            error!(?report, "start-up registration failed; continuing");
        }
    }

    // ── Start HTTP server ───────────────────────────────
    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    let server_state = Arc::clone(&state);
    let server_handle = tokio::spawn(async move {
        if let Err(err) = server::serve(server_state, server_ct).await {
            error!(%err, "webhook server failed");
        }
    });

    info!("ledger-bot ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    if let Err(err) = server_handle.await {
        error!(%err, "webhook server task panicked");
    }
    info!("ledger-bot shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
