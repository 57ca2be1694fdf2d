//! Webhook update dispatch.
//!
//! Every update passes the admin gate before reaching a handler. Updates
//! from other chats are dropped without a reply and logged as security
//! events, so outsiders learn nothing about the bot.

use tracing::{debug, info, info_span, warn, Instrument};

use crate::state::AppState;
use crate::telegram::handlers::approval::{self, ButtonPress};
use crate::telegram::handlers::command;
use crate::telegram::update::{parse_command, BotCommandKind, InboundUpdate};

/// Check `chat_id` against the admin set, logging rejected attempts.
fn is_authorized(state: &AppState, chat_id: Option<i64>, kind: &str) -> bool {
    if state.admins.is_authorized(chat_id) {
        return true;
    }

    warn!(
        chat_id,
        kind, "update from non-admin chat (silently ignored)"
    );
    false
}

/// Route one classified update. Never fails; handler errors are logged.
pub async fn handle_update(state: &AppState, update: InboundUpdate) {
    let span = match &update {
        InboundUpdate::Command { chat_id, .. } => {
            info_span!("telegram_update", kind = "command", chat_id)
        }
        InboundUpdate::Callback {
            callback_id,
            sender_id,
            ..
        } => info_span!(
            "telegram_update",
            kind = "callback",
            callback_id = %callback_id,
            sender_id
        ),
        InboundUpdate::Unrecognized => info_span!("telegram_update", kind = "unrecognized"),
    };

    dispatch(state, update).instrument(span).await;
}

async fn dispatch(state: &AppState, update: InboundUpdate) {
    match update {
        InboundUpdate::Command {
            chat_id,
            sender_id,
            text,
        } => {
            let Some(command) = parse_command(&text) else {
                debug!("text is not a command");
                return;
            };
            if !is_authorized(state, Some(chat_id), "command") {
                return;
            }

            info!(?command, sender_id, "dispatching command");
            let result = match command {
                BotCommandKind::Queue => command::handle_queue(state, chat_id).await,
                BotCommandKind::Start => command::handle_start(state, chat_id).await,
            };
            if let Err(err) = result {
                warn!(%err, ?command, "command reply failed");
            }
        }
        InboundUpdate::Callback {
            callback_id,
            sender_id,
            sender_handle,
            origin,
            payload,
        } => {
            // Without the origin message there is no chat to gate on.
            let Some(origin) = origin else {
                warn!("callback without origin message (ignored)");
                return;
            };
            if !is_authorized(state, Some(origin.chat_id), "callback") {
                return;
            }

            approval::handle_button_press(
                state,
                ButtonPress {
                    callback_id: &callback_id,
                    sender_id,
                    sender_handle: sender_handle.as_deref(),
                    origin: &origin,
                    payload: payload.as_deref(),
                },
            )
            .await;
        }
        InboundUpdate::Unrecognized => {
            debug!("unrecognized update acknowledged");
        }
    }
}
