//! Classification of inbound webhook payloads.
//!
//! [`classify`] maps any JSON value onto exactly one [`InboundUpdate`]
//! variant and never fails: shapes the bot does not handle become
//! [`InboundUpdate::Unrecognized`].

use serde::Deserialize;
use serde_json::Value;
use teloxide::types::{CallbackQuery, MaybeInaccessibleMessage, Message, Update, UpdateKind};

/// The message a pressed button is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginMessage {
    /// Chat holding the message.
    pub chat_id: i64,
    /// Message identifier.
    pub message_id: i32,
    /// Plain text currently shown.
    pub text: String,
}

/// A webhook update reduced to what the dispatcher acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundUpdate {
    /// A text message.
    Command {
        /// Chat the text was sent in.
        chat_id: i64,
        /// Sender, when Telegram reports one.
        sender_id: Option<i64>,
        /// Raw text.
        text: String,
    },
    /// An inline button press.
    Callback {
        /// Identifier for `answerCallbackQuery`.
        callback_id: String,
        /// User who pressed the button.
        sender_id: i64,
        /// Sender's public handle, without `@`.
        sender_handle: Option<String>,
        /// Message carrying the button.
        origin: Option<OriginMessage>,
        /// Raw `callback_data`.
        payload: Option<String>,
    },
    /// Anything else; acknowledged and ignored.
    Unrecognized,
}

/// Classify a parsed webhook body.
#[must_use]
pub fn classify(body: &Value) -> InboundUpdate {
    let Ok(update) = Update::deserialize(body) else {
        return InboundUpdate::Unrecognized;
    };

    match update.kind {
        UpdateKind::CallbackQuery(query) => from_callback(query),
        UpdateKind::Message(message) => from_message(&message),
        _ => InboundUpdate::Unrecognized,
    }
}

fn from_message(message: &Message) -> InboundUpdate {
    match message.text() {
        Some(text) => InboundUpdate::Command {
            chat_id: message.chat.id.0,
            sender_id: message.from.as_ref().and_then(|user| i64::try_from(user.id.0).ok()),
            text: text.to_owned(),
        },
        None => InboundUpdate::Unrecognized,
    }
}

fn from_callback(query: CallbackQuery) -> InboundUpdate {
    let origin = match &query.message {
        Some(MaybeInaccessibleMessage::Regular(message)) => Some(OriginMessage {
            chat_id: message.chat.id.0,
            message_id: message.id.0,
            text: message.text().unwrap_or_default().to_owned(),
        }),
        _ => None,
    };
    // Telegram user ids fit in 52 bits.
    let Ok(sender_id) = i64::try_from(query.from.id.0) else {
        return InboundUpdate::Unrecognized;
    };
    InboundUpdate::Callback {
        callback_id: query.id.to_string(),
        sender_id,
        sender_handle: query.from.username.filter(|name| !name.is_empty()),
        origin,
        payload: query.data,
    }
}

/// Commands the bot recognises in text messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommandKind {
    /// List records awaiting approval.
    Queue,
    /// Greeting and command overview.
    Start,
}

const QUEUE_WORDS: &[&str] = &["/queue", "/pending", "/approvals", "queue", "pending"];
const START_WORDS: &[&str] = &["/start", "/help", "start"];

/// Match message text against the recognised commands.
///
/// Only the first word counts; matching is case-insensitive and a trailing
/// `@botname` mention (as Telegram appends in groups) is ignored.
#[must_use]
pub fn parse_command(text: &str) -> Option<BotCommandKind> {
    let first = text.split_whitespace().next()?;
    let word = first
        .split_once('@')
        .map_or(first, |(head, _)| head)
        .to_lowercase();

    if QUEUE_WORDS.contains(&word.as_str()) {
        Some(BotCommandKind::Queue)
    } else if START_WORDS.contains(&word.as_str()) {
        Some(BotCommandKind::Start)
    } else {
        None
    }
}
