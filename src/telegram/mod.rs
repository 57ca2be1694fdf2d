//! Telegram bridge layer modules.
//!
//! [`ChatPlatform`] is the seam between the bot's logic and the Bot API.
//! [`client::TelegramClient`] implements it on top of `teloxide::Bot`; tests
//! substitute a recording fake.

pub mod callback;
pub mod client;
pub mod events;
pub mod format;
pub mod handlers;
pub mod notifier;
pub mod update;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::Serialize;
use teloxide::types::{BotCommand, InlineKeyboardMarkup};

use crate::Result;

/// Boxed future returned by [`ChatPlatform`] methods.
pub type PlatformFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Identifier of a message the bot just posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    /// Message identifier within its chat.
    pub message_id: i32,
}

/// Webhook registration as Telegram reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WebhookStatus {
    /// Registered URL; `None` when no webhook is set.
    pub url: Option<String>,
    /// Updates waiting for delivery.
    pub pending_update_count: u32,
    /// Last delivery error reported by Telegram.
    pub last_error_message: Option<String>,
    /// When the last delivery error happened.
    pub last_error_date: Option<DateTime<Utc>>,
}

/// Outbound Bot API operations used by the bot.
///
/// Every method performs exactly one remote call and never retries.
/// Failures surface as `AppError::Telegram`.
pub trait ChatPlatform: Send + Sync {
    /// Post an HTML message, optionally with an inline keyboard.
    fn send_message<'a>(
        &'a self,
        chat_id: i64,
        text: &'a str,
        keyboard: Option<&'a InlineKeyboardMarkup>,
    ) -> PlatformFuture<'a, SentMessage>;

    /// Replace the text (and keyboard) of an existing message.
    fn edit_message_text<'a>(
        &'a self,
        chat_id: i64,
        message_id: i32,
        text: &'a str,
        keyboard: Option<&'a InlineKeyboardMarkup>,
    ) -> PlatformFuture<'a, ()>;

    /// Answer a button press with a toast or an alert.
    fn answer_callback_query<'a>(
        &'a self,
        callback_id: &'a str,
        text: Option<&'a str>,
        show_alert: bool,
    ) -> PlatformFuture<'a, ()>;

    /// Point update delivery at `url`.
    fn set_webhook<'a>(&'a self, url: &'a str, secret: Option<&'a str>) -> PlatformFuture<'a, ()>;

    /// Stop webhook delivery.
    fn delete_webhook(&self) -> PlatformFuture<'_, ()>;

    /// Current webhook registration as Telegram sees it.
    fn get_webhook_info(&self) -> PlatformFuture<'_, WebhookStatus>;

    /// Replace the command menu shown in clients.
    fn set_my_commands<'a>(&'a self, commands: &'a [BotCommand]) -> PlatformFuture<'a, ()>;
}
