use std::time::Duration;

use ledger_bot::{config::GlobalConfig, AppError};

fn sample_toml() -> &'static str {
    r#"
bind_address = "127.0.0.1"
http_port = 9000
database_path = "/var/lib/ledger-bot/records.db"
currency = "UZS"

[telegram]
admin_chat_ids = [100, 200]
base_url = "https://bot.example.com/"
webhook_path = "/hooks/tg"

[timeouts]
telegram_seconds = 7
store_seconds = 3
"#
}

fn minimal_toml() -> &'static str {
    r#"
[telegram]
admin_chat_ids = [100]
base_url = "https://bot.example.com"
"#
}

#[test]
fn parses_full_config() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.bind_address, "127.0.0.1");
    assert_eq!(config.http_port, 9000);
    assert_eq!(config.currency, "UZS");
    assert_eq!(config.telegram.admin_chat_ids, vec![100, 200]);
    assert_eq!(config.telegram_timeout(), Duration::from_secs(7));
    assert_eq!(config.store_timeout(), Duration::from_secs(3));
}

#[test]
fn minimal_config_uses_defaults() {
    let config = GlobalConfig::from_toml_str(minimal_toml()).expect("config parses");

    assert_eq!(config.bind_address, "0.0.0.0");
    assert_eq!(config.http_port, 8080);
    assert_eq!(config.currency, "");
    assert_eq!(config.telegram.webhook_path, "/api/telegram/webhook");
    assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
    assert_eq!(config.telegram_timeout(), Duration::from_secs(10));
    assert_eq!(config.store_timeout(), Duration::from_secs(5));
}

#[test]
fn secrets_are_never_read_from_file() {
    let raw = r#"
notify_token = "leaked"

[telegram]
admin_chat_ids = [100]
base_url = "https://bot.example.com"
bot_token = "leaked"
webhook_secret = "leaked"
"#;
    let config = GlobalConfig::from_toml_str(raw).expect("config parses");

    assert!(config.telegram.bot_token.is_empty());
    assert!(config.telegram.webhook_secret.is_none());
    assert!(config.notify_token.is_none());
}

#[test]
fn webhook_url_joins_base_and_path() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");
    assert_eq!(
        config.telegram.webhook_url(),
        "https://bot.example.com/hooks/tg"
    );
}

#[test]
fn empty_admin_list_is_rejected() {
    let raw = r#"
[telegram]
admin_chat_ids = []
base_url = "https://bot.example.com"
"#;
    let err = GlobalConfig::from_toml_str(raw).expect_err("empty admins");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("admin_chat_ids")));
}

#[test]
fn relative_base_url_is_rejected() {
    let raw = r#"
[telegram]
admin_chat_ids = [1]
base_url = "bot.example.com"
"#;
    let err = GlobalConfig::from_toml_str(raw).expect_err("relative url");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("base_url")));
}

#[test]
fn webhook_path_must_be_absolute() {
    let raw = r#"
[telegram]
admin_chat_ids = [1]
base_url = "https://bot.example.com"
webhook_path = "hook"
"#;
    let err = GlobalConfig::from_toml_str(raw).expect_err("relative path");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("webhook_path")));
}

#[test]
fn zero_timeout_is_rejected() {
    let raw = format!("{}\n[timeouts]\nstore_seconds = 0\n", minimal_toml());
    let err = GlobalConfig::from_toml_str(&raw).expect_err("zero timeout");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn malformed_toml_is_config_error() {
    let err = GlobalConfig::from_toml_str("[telegram\nadmin_chat_ids = ").expect_err("bad toml");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("invalid config")));
}

#[test]
fn load_from_missing_path_fails() {
    let err = GlobalConfig::load_from_path("/nonexistent/ledger-bot/config.toml")
        .expect_err("missing file");
    assert!(matches!(err, AppError::Config(msg) if msg.contains("failed to read config")));
}

#[test]
fn load_from_path_reads_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, minimal_toml()).expect("write config");

    let config = GlobalConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.telegram.admin_chat_ids, vec![100]);
}
