//! Approve / Reject button handler.
//!
//! The press is acknowledged before the store is touched so the client
//! stops its spinner even when the store is slow. After a successful
//! transition the buttons are replaced with a static outcome line.

use chrono::Utc;
use tracing::{info, warn};

use crate::approval;
use crate::state::AppState;
use crate::telegram::callback;
use crate::telegram::format;
use crate::telegram::update::OriginMessage;
use crate::AppError;

/// Alert shown for a payload the codec cannot read.
pub const INVALID_BUTTON_TEXT: &str = "\u{26a0}\u{fe0f} Invalid button.";

/// A button press that already passed the admin gate.
#[derive(Debug, Clone)]
pub struct ButtonPress<'a> {
    /// Identifier for `answerCallbackQuery`.
    pub callback_id: &'a str,
    /// User who pressed the button.
    pub sender_id: i64,
    /// Sender's public handle, without `@`.
    pub sender_handle: Option<&'a str>,
    /// Message carrying the button.
    pub origin: &'a OriginMessage,
    /// Raw `callback_data`.
    pub payload: Option<&'a str>,
}

impl ButtonPress<'_> {
    /// Name recorded as the approver: `@handle` when the sender has one,
    /// otherwise the numeric user id.
    #[must_use]
    pub fn actor(&self) -> String {
        self.sender_handle
            .map_or_else(|| self.sender_id.to_string(), |handle| format!("@{handle}"))
    }
}

/// User-facing text for a failed transition.
#[must_use]
pub fn failure_text(err: &AppError) -> &'static str {
    match err {
        AppError::NotFound(_) => "\u{2753} Record not found. It may have been deleted.",
        AppError::NotActionable(_) => "\u{1f6ab} This record can no longer be approved or rejected.",
        _ => "\u{26a0}\u{fe0f} Could not save the decision. Please try again.",
    }
}

/// Decode the payload, acknowledge, apply the decision, and update the
/// origin message. Every failure is absorbed here.
pub async fn handle_button_press(state: &AppState, press: ButtonPress<'_>) {
    let decoded = match callback::decode(press.payload.unwrap_or_default()) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(%err, "rejected malformed callback payload");
            if let Err(err) = state
                .notifier
                .acknowledge_callback(press.callback_id, Some(INVALID_BUTTON_TEXT), true)
                .await
            {
                warn!(%err, "failed to answer malformed callback");
            }
            return;
        }
    };

    let record_id = decoded.record_id.as_str();
    if let Err(err) = state
        .notifier
        .acknowledge_callback(
            press.callback_id,
            Some(format::action_ack_text(decoded.action)),
            false,
        )
        .await
    {
        warn!(%err, record_id, "failed to acknowledge button press");
    }

    let actor = press.actor();
    let result = state
        .with_store_timeout(approval::apply(
            state.store.as_ref(),
            record_id,
            decoded.action,
            &actor,
            Utc::now(),
        ))
        .await;

    let transition = match result {
        Ok(transition) => transition,
        Err(err) => {
            warn!(%err, record_id, action = decoded.action.keyword(), "approval transition failed");
            report_failure(state, &press, failure_text(&err)).await;
            return;
        }
    };

    info!(
        record_id,
        status = %transition.status,
        outcome = ?transition.outcome,
        "approval processed"
    );

    let outcome = format::outcome_line(
        transition.status,
        &transition.approved_by,
        transition.approved_at,
    );
    let text = format::with_outcome(&press.origin.text, &outcome);
    if let Err(err) = state
        .notifier
        .edit_origin_message(press.origin.chat_id, press.origin.message_id, &text, true)
        .await
    {
        warn!(%err, record_id, "failed to replace approval buttons");
    }
}

/// Tell the admin why the press had no effect. The callback was already
/// answered once, so Telegram may refuse the alert; the origin chat is the
/// fallback.
async fn report_failure(state: &AppState, press: &ButtonPress<'_>, text: &str) {
    let Err(err) = state
        .notifier
        .acknowledge_callback(press.callback_id, Some(text), true)
        .await
    else {
        return;
    };

    warn!(%err, "failure alert refused, posting to chat");
    if let Err(err) = state
        .notifier
        .send_message(press.origin.chat_id, text)
        .await
    {
        warn!(%err, chat_id = press.origin.chat_id, "failed to report approval failure");
    }
}
