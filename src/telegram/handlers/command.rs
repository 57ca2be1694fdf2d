//! Text command handlers: `/queue` and `/start`.

use tracing::{info, warn};

use crate::models::record::FinancialRecord;
use crate::state::AppState;
use crate::telegram::format;
use crate::Result;

/// Sent when the pending queue cannot be loaded.
pub const QUEUE_UNAVAILABLE_TEXT: &str =
    "\u{26a0}\u{fe0f} Could not load the approval queue. Please try again later.";

/// List records awaiting approval into `chat_id`.
///
/// A store failure is reported to the chat instead of the queue.
///
/// # Errors
///
/// Returns `AppError::Telegram` if the reply cannot be sent.
pub async fn handle_queue(state: &AppState, chat_id: i64) -> Result<()> {
    let records = state
        .with_store_timeout(state.store.list_records())
        .await;

    let text = match records {
        Ok(records) => {
            let pending: Vec<FinancialRecord> =
                records.into_iter().filter(FinancialRecord::is_pending).collect();
            info!(chat_id, pending = pending.len(), "rendering approval queue");
            format::queue_message(&pending, state.notifier.currency())
        }
        Err(err) => {
            warn!(%err, chat_id, "failed to load approval queue");
            QUEUE_UNAVAILABLE_TEXT.to_owned()
        }
    };

    state.notifier.send_message(chat_id, &text).await?;
    Ok(())
}

/// Reply with the greeting and command overview.
///
/// # Errors
///
/// Returns `AppError::Telegram` if the reply cannot be sent.
pub async fn handle_start(state: &AppState, chat_id: i64) -> Result<()> {
    state
        .notifier
        .send_message(chat_id, &format::greeting())
        .await?;
    Ok(())
}
