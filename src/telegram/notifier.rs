//! Outbound notifier: every message the bot sends goes through here.

use std::sync::Arc;

use serde::Serialize;
use teloxide::types::{BotCommand, InlineKeyboardMarkup};
use tracing::{info, warn};

use crate::models::record::FinancialRecord;
use crate::models::supply::SupplyRequest;
use crate::Result;

use super::format::{self, MESSAGE_CHUNK_LIMIT};
use super::{ChatPlatform, SentMessage, WebhookStatus};

/// A business event announced to admin chats.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A new income or expense record.
    Transaction(FinancialRecord),
    /// A new supply request.
    Supply(SupplyRequest),
}

/// Fan-out result of [`Notifier::send_structured`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Chats the announcement reached.
    pub delivered: Vec<i64>,
    /// Chats the announcement could not be delivered to.
    pub failed: Vec<i64>,
}

impl DeliveryReport {
    /// Whether every target chat received the announcement.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of one registration call, shaped for operator-facing JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallReport {
    /// Whether Telegram accepted the call.
    pub ok: bool,
    /// Error text on failure.
    pub description: Option<String>,
}

impl From<Result<()>> for CallReport {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                description: None,
            },
            Err(err) => Self {
                ok: false,
                description: Some(err.to_string()),
            },
        }
    }
}

/// Result of registering the webhook and the command menu together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationReport {
    /// URL submitted to Telegram.
    pub webhook_url: String,
    /// `setWebhook` outcome.
    pub telegram: CallReport,
    /// `setMyCommands` outcome.
    pub menu: CallReport,
}

impl RegistrationReport {
    /// Whether both calls succeeded.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.telegram.ok && self.menu.ok
    }
}

/// Commands advertised in the Telegram client menu.
#[must_use]
pub fn command_menu() -> Vec<BotCommand> {
    vec![
        BotCommand::new("queue", "List records awaiting approval"),
        BotCommand::new("start", "Show available commands"),
    ]
}

/// Formats and sends outbound messages over a [`ChatPlatform`].
#[derive(Clone)]
pub struct Notifier {
    platform: Arc<dyn ChatPlatform>,
    currency: String,
}

impl Notifier {
    /// Create a notifier rendering amounts with `currency`.
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>, currency: impl Into<String>) -> Self {
        Self {
            platform,
            currency: currency.into(),
        }
    }

    /// Currency label used in rendered amounts.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Answer a button press. Pass `show_alert` for a modal alert instead of
    /// a toast.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if Telegram refuses the answer.
    pub async fn acknowledge_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()> {
        self.platform
            .answer_callback_query(callback_id, text, show_alert)
            .await
    }

    /// Rewrite the message a button was attached to, optionally removing
    /// its keyboard.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if the edit fails.
    pub async fn edit_origin_message(
        &self,
        chat_id: i64,
        message_id: i32,
        new_text: &str,
        remove_buttons: bool,
    ) -> Result<()> {
        let empty = InlineKeyboardMarkup::default();
        let keyboard = remove_buttons.then_some(&empty);
        self.platform
            .edit_message_text(chat_id, message_id, new_text, keyboard)
            .await
    }

    /// Send an HTML message, split into several when it exceeds the
    /// per-message limit. Returns the sent parts in order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` on the first part that fails; earlier
    /// parts stay delivered.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Vec<SentMessage>> {
        let mut sent = Vec::new();
        for chunk in format::split_message(text, MESSAGE_CHUNK_LIMIT) {
            sent.push(self.platform.send_message(chat_id, &chunk, None).await?);
        }
        Ok(sent)
    }

    /// Announce a notification to every chat in `chat_ids`.
    ///
    /// Pending transactions carry Approve / Reject buttons. A failure for
    /// one chat does not stop delivery to the others.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidPayload` when the record id cannot be
    /// carried in a button payload. Per-chat delivery failures are reported
    /// in the [`DeliveryReport`] instead.
    pub async fn send_structured(
        &self,
        chat_ids: &[i64],
        notification: &Notification,
    ) -> Result<DeliveryReport> {
        let (text, keyboard) = match notification {
            Notification::Transaction(record) => {
                let keyboard = if record.is_pending() {
                    Some(format::approval_keyboard(&record.id)?)
                } else {
                    None
                };
                (
                    format::transaction_announcement(record, &self.currency),
                    keyboard,
                )
            }
            Notification::Supply(request) => (format::supply_announcement(request), None),
        };

        let mut report = DeliveryReport::default();
        for &chat_id in chat_ids {
            match self
                .platform
                .send_message(chat_id, &text, keyboard.as_ref())
                .await
            {
                Ok(sent) => {
                    info!(chat_id, message_id = sent.message_id, "announcement delivered");
                    report.delivered.push(chat_id);
                }
                Err(err) => {
                    warn!(%err, chat_id, "announcement delivery failed");
                    report.failed.push(chat_id);
                }
            }
        }
        Ok(report)
    }

    /// Register `webhook_url` (with the optional secret) and install the
    /// command menu. Both calls are attempted; neither is retried.
    pub async fn register(&self, webhook_url: &str, secret: Option<&str>) -> RegistrationReport {
        let telegram = CallReport::from(self.register_webhook(webhook_url, secret).await);
        let menu = CallReport::from(self.set_command_menu().await);
        RegistrationReport {
            webhook_url: webhook_url.to_owned(),
            telegram,
            menu,
        }
    }

    /// Point Telegram's update delivery at `webhook_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if Telegram refuses the registration.
    pub async fn register_webhook(&self, webhook_url: &str, secret: Option<&str>) -> Result<()> {
        self.platform.set_webhook(webhook_url, secret).await
    }

    /// Current webhook registration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if the query fails.
    pub async fn webhook_status(&self) -> Result<WebhookStatus> {
        self.platform.get_webhook_info().await
    }

    /// Install [`command_menu`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if Telegram refuses the menu.
    pub async fn set_command_menu(&self) -> Result<()> {
        self.platform.set_my_commands(&command_menu()).await
    }

    /// Stop webhook delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if Telegram refuses the call.
    pub async fn remove_webhook(&self) -> Result<()> {
        self.platform.delete_webhook().await
    }
}
