#![forbid(unsafe_code)]

//! Operator CLI for the bot's Telegram registration.
//!
//! Loads the same configuration and credentials as the server and calls the
//! Bot API directly, printing Telegram's answer as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use ledger_bot::telegram::client::TelegramClient;
use ledger_bot::telegram::notifier::command_menu;
use ledger_bot::{GlobalConfig, Result};

#[derive(Debug, Parser)]
#[command(
    name = "ledger-bot-ctl",
    about = "Manage the ledger-bot Telegram registration",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Point Telegram at the configured webhook URL.
    SetWebhook {
        /// Override the URL instead of `base_url + webhook_path`.
        #[arg(long)]
        url: Option<String>,
    },
    /// Show the webhook registration as Telegram reports it.
    WebhookStatus,
    /// Install the bot's command menu.
    SetCommands,
    /// Stop webhook delivery.
    DeleteWebhook,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = GlobalConfig::load_from_path(&cli.config)?;
    config.load_credentials().await?;
    let client = TelegramClient::from_config(&config.telegram, config.telegram_timeout())?;

    let output = match cli.command {
        Command::SetWebhook { url } => {
            let url = url.unwrap_or_else(|| config.telegram.webhook_url());
            client
                .register_webhook(&url, config.telegram.webhook_secret.as_deref())
                .await?;
            json!({ "ok": true, "webhookUrl": url })
        }
        Command::WebhookStatus => {
            let info = client.webhook_info().await?;
            json!({
                "ok": true,
                "webhookSet": info.url.is_some(),
                "webhookUrl": info.url,
                "pendingUpdateCount": info.pending_update_count,
                "lastErrorMessage": info.last_error_message,
                "lastErrorDate": info.last_error_date,
            })
        }
        Command::SetCommands => {
            let menu = command_menu();
            client.register_commands(&menu).await?;
            json!({
                "ok": true,
                "commands": menu.iter().map(|c| c.command.as_str()).collect::<Vec<_>>(),
            })
        }
        Command::DeleteWebhook => {
            client.remove_webhook().await?;
            json!({ "ok": true })
        }
    };

    println!("{output:#}");
    Ok(())
}
