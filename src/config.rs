//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which bot credentials are stored.
pub const KEYRING_SERVICE: &str = "ledger-bot";

/// Default route that receives Telegram updates.
pub const DEFAULT_WEBHOOK_PATH: &str = "/api/telegram/webhook";

/// Telegram connectivity settings.
///
/// Secrets are loaded at runtime via OS keychain or environment variables,
/// not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TelegramConfig {
    /// Chat identifiers allowed to approve, reject, and list the queue.
    /// These chats also receive every outbound announcement.
    pub admin_chat_ids: Vec<i64>,
    /// Public base URL of this service, used to build the webhook target.
    pub base_url: String,
    /// Route on this service that receives updates.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
    /// Bot API root; overridable for tests and self-hosted API servers.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Bot token (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
    /// Shared secret echoed by Telegram in `X-Telegram-Bot-Api-Secret-Token`
    /// (populated at runtime, optional).
    #[serde(skip)]
    pub webhook_secret: Option<String>,
}

impl TelegramConfig {
    /// Absolute URL Telegram should deliver updates to.
    #[must_use]
    pub fn webhook_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.webhook_path)
    }
}

fn default_webhook_path() -> String {
    DEFAULT_WEBHOOK_PATH.into()
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".into()
}

/// Upper bounds (seconds) for outbound calls.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Per-request timeout for Telegram Bot API calls.
    #[serde(default = "default_telegram_seconds")]
    pub telegram_seconds: u64,
    /// Per-operation timeout for record store reads and writes.
    #[serde(default = "default_store_seconds")]
    pub store_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            telegram_seconds: default_telegram_seconds(),
            store_seconds: default_store_seconds(),
        }
    }
}

fn default_telegram_seconds() -> u64 {
    10
}

fn default_store_seconds() -> u64 {
    5
}

fn default_http_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "0.0.0.0".into()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("ledger-bot.db")
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Telegram connectivity settings.
    pub telegram: TelegramConfig,
    /// Interface the HTTP server binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// HTTP port for the webhook server.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// `SQLite` file backing the record store.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Currency label appended to rendered amounts; empty renders bare numbers.
    #[serde(default)]
    pub currency: String,
    /// Outbound call timeouts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Bearer token guarding the `/notify/*` routes (populated at runtime).
    #[serde(skip)]
    pub notify_token: Option<String>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load bot credentials from OS keychain with env-var fallback.
    ///
    /// The bot token is required. The webhook secret and the notify token
    /// are optional and left as `None` when neither source provides them.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the bot token cannot be found.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.telegram.bot_token =
            load_credential("telegram_bot_token", "TELEGRAM_BOT_TOKEN").await?;
        self.telegram.webhook_secret =
            load_optional_credential("telegram_webhook_secret", "TELEGRAM_WEBHOOK_SECRET").await;
        self.notify_token =
            load_optional_credential("notify_token", "LEDGER_BOT_NOTIFY_TOKEN").await;
        Ok(())
    }

    /// Timeout applied to each Telegram request.
    #[must_use]
    pub fn telegram_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.telegram_seconds)
    }

    /// Timeout applied to each record store operation.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.store_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.admin_chat_ids.is_empty() {
            return Err(AppError::Config(
                "telegram.admin_chat_ids must not be empty".into(),
            ));
        }

        let base = self.telegram.base_url.trim();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(AppError::Config(format!(
                "telegram.base_url must be an absolute http(s) URL, got '{base}'"
            )));
        }

        if !self.telegram.webhook_path.starts_with('/') {
            return Err(AppError::Config(
                "telegram.webhook_path must start with '/'".into(),
            ));
        }

        if self.timeouts.telegram_seconds == 0 || self.timeouts.store_seconds == 0 {
            return Err(AppError::Config(
                "timeouts must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Look up a credential in the OS keychain.
///
/// Returns `None` when the entry is absent, empty, or the keychain is
/// unavailable on this host.
async fn keychain_lookup(keyring_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
            Ok(None)
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
            Ok(None)
        }
    }
}

fn env_lookup(env_key: &str) -> Option<String> {
    env::var(env_key).ok().filter(|value| !value.trim().is_empty())
}

/// Load a single required credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    if let Some(value) = keychain_lookup(keyring_key).await? {
        return Ok(value);
    }

    env_lookup(env_key).ok_or_else(|| {
        AppError::Config(format!(
            "credential {keyring_key} not found in keychain service '{KEYRING_SERVICE}' \
             or {env_key} env var"
        ))
    })
}

/// Load an optional credential; absence is not an error.
async fn load_optional_credential(keyring_key: &str, env_key: &str) -> Option<String> {
    match keychain_lookup(keyring_key).await {
        Ok(Some(value)) => Some(value),
        Ok(None) => env_lookup(env_key),
        Err(err) => {
            warn!(key = keyring_key, %err, "optional credential lookup failed");
            env_lookup(env_key)
        }
    }
}
