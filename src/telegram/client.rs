//! Bot API client built on `teloxide::Bot`.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{
    AllowedUpdate, BotCommand, InlineKeyboardMarkup, MessageId, ParseMode, WebhookInfo,
};
use teloxide::RequestError;
use tracing::{debug, warn};
use url::Url;

use crate::config::TelegramConfig;
use crate::{AppError, Result};

use super::{ChatPlatform, PlatformFuture, SentMessage, WebhookStatus};

/// Update kinds requested from Telegram when registering the webhook.
const ALLOWED_UPDATES: [AllowedUpdate; 2] = [AllowedUpdate::Message, AllowedUpdate::CallbackQuery];

/// A `teloxide::Bot` with the per-request timeout and API endpoint taken
/// from configuration.
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_url", &self.bot.api_url().as_str())
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Build a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the token is empty or the API URL does
    /// not parse, and `AppError::Telegram` if the HTTP client cannot be
    /// created.
    pub fn new(api_base_url: &str, bot_token: &str, timeout: Duration) -> Result<Self> {
        if bot_token.trim().is_empty() {
            return Err(AppError::Config("telegram bot token is empty".into()));
        }

        let api_url = Url::parse(api_base_url).map_err(|err| {
            AppError::Config(format!("invalid telegram api_base_url {api_base_url:?}: {err}"))
        })?;

        let http = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Telegram(format!("failed to init http client: {err}")))?;

        Ok(Self {
            bot: Bot::with_client(bot_token, http).set_api_url(api_url),
        })
    }

    /// Build a client from the loaded Telegram configuration.
    ///
    /// # Errors
    ///
    /// See [`TelegramClient::new`].
    pub fn from_config(config: &TelegramConfig, timeout: Duration) -> Result<Self> {
        Self::new(&config.api_base_url, &config.bot_token, timeout)
    }

    /// Map a failed request onto `AppError::Telegram`.
    ///
    /// Request URLs embed the bot token, so it is scrubbed from the text
    /// before the error can reach a log line or an HTTP reply.
    fn request_failed(&self, method: &str, err: &RequestError) -> AppError {
        if let RequestError::RetryAfter(after) = err {
            warn!(method, retry_after = ?after, "telegram flood control");
        }
        let text = err.to_string().replace(self.bot.token(), "<token>");
        AppError::Telegram(format!("{method} failed: {text}"))
    }

    /// `sendMessage` with HTML parse mode.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if the call fails or Telegram refuses it.
    pub async fn send_html(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<SentMessage> {
        debug!(chat_id, "sendMessage");
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard.clone());
        }
        let message = request
            .await
            .map_err(|err| self.request_failed("sendMessage", &err))?;
        Ok(SentMessage {
            message_id: message.id.0,
        })
    }

    /// `editMessageText` with HTML parse mode.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if the call fails or Telegram refuses it.
    pub async fn edit_html(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        debug!(chat_id, message_id, "editMessageText");
        let mut request = self
            .bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard.clone());
        }
        request
            .await
            .map_err(|err| self.request_failed("editMessageText", &err))?;
        Ok(())
    }

    /// `answerCallbackQuery`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if the call fails or Telegram refuses it,
    /// for example because the query is too old.
    pub async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()> {
        let mut request = self
            .bot
            .answer_callback_query(teloxide::types::CallbackQueryId(callback_id.to_owned()))
            .show_alert(show_alert);
        if let Some(text) = text {
            request = request.text(text);
        }
        request
            .await
            .map_err(|err| self.request_failed("answerCallbackQuery", &err))?;
        Ok(())
    }

    /// `setWebhook` restricted to the update kinds the bot handles.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unparsable URL and
    /// `AppError::Telegram` if the call fails or Telegram refuses it.
    pub async fn register_webhook(&self, url: &str, secret: Option<&str>) -> Result<()> {
        let url = Url::parse(url)
            .map_err(|err| AppError::Config(format!("invalid webhook url {url:?}: {err}")))?;
        let mut request = self.bot.set_webhook(url).allowed_updates(ALLOWED_UPDATES);
        if let Some(secret) = secret {
            request = request.secret_token(secret);
        }
        request
            .await
            .map_err(|err| self.request_failed("setWebhook", &err))?;
        Ok(())
    }

    /// `deleteWebhook`, keeping queued updates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if the call fails or Telegram refuses it.
    pub async fn remove_webhook(&self) -> Result<()> {
        self.bot
            .delete_webhook()
            .await
            .map_err(|err| self.request_failed("deleteWebhook", &err))?;
        Ok(())
    }

    /// `getWebhookInfo`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if the call fails or Telegram refuses it.
    pub async fn webhook_info(&self) -> Result<WebhookStatus> {
        let info = self
            .bot
            .get_webhook_info()
            .await
            .map_err(|err| self.request_failed("getWebhookInfo", &err))?;
        Ok(WebhookStatus::from(info))
    }

    /// `setMyCommands`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if the call fails or Telegram refuses it.
    pub async fn register_commands(&self, commands: &[BotCommand]) -> Result<()> {
        self.bot
            .set_my_commands(commands.to_vec())
            .await
            .map_err(|err| self.request_failed("setMyCommands", &err))?;
        Ok(())
    }
}

impl From<WebhookInfo> for WebhookStatus {
    fn from(info: WebhookInfo) -> Self {
        Self {
            url: info.url.map(|url| url.to_string()),
            pending_update_count: info.pending_update_count,
            last_error_message: info.last_error_message,
            last_error_date: info.last_error_date,
        }
    }
}

impl ChatPlatform for TelegramClient {
    fn send_message<'a>(
        &'a self,
        chat_id: i64,
        text: &'a str,
        keyboard: Option<&'a InlineKeyboardMarkup>,
    ) -> PlatformFuture<'a, SentMessage> {
        Box::pin(self.send_html(chat_id, text, keyboard))
    }

    fn edit_message_text<'a>(
        &'a self,
        chat_id: i64,
        message_id: i32,
        text: &'a str,
        keyboard: Option<&'a InlineKeyboardMarkup>,
    ) -> PlatformFuture<'a, ()> {
        Box::pin(self.edit_html(chat_id, message_id, text, keyboard))
    }

    fn answer_callback_query<'a>(
        &'a self,
        callback_id: &'a str,
        text: Option<&'a str>,
        show_alert: bool,
    ) -> PlatformFuture<'a, ()> {
        Box::pin(self.answer_callback(callback_id, text, show_alert))
    }

    fn set_webhook<'a>(&'a self, url: &'a str, secret: Option<&'a str>) -> PlatformFuture<'a, ()> {
        Box::pin(self.register_webhook(url, secret))
    }

    fn delete_webhook(&self) -> PlatformFuture<'_, ()> {
        Box::pin(self.remove_webhook())
    }

    fn get_webhook_info(&self) -> PlatformFuture<'_, WebhookStatus> {
        Box::pin(self.webhook_info())
    }

    fn set_my_commands<'a>(&'a self, commands: &'a [BotCommand]) -> PlatformFuture<'a, ()> {
        Box::pin(self.register_commands(commands))
    }
}
