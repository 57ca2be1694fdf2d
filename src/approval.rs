//! Approval state machine.
//!
//! `pending` moves to `approved` or `rejected` on an admin decision, which
//! stamps who decided and when. Repeating the decision a record already
//! carries changes nothing. The opposite decision overwrites the earlier one
//! and takes a new stamp. `ignored` records are owned by the host
//! application and refuse every action.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::approval::{ApprovalAction, ApprovalStatus};
use crate::models::record::FinancialRecord;
use crate::persistence::{ApprovalStamp, RecordStore};
use crate::{AppError, Result};

/// Whether a decision changed the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The status changed and a new stamp was written.
    Applied,
    /// The record already carried this decision; nothing was written.
    Unchanged,
}

/// What [`decide`] concluded for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Status before the action.
    pub previous: ApprovalStatus,
    /// Stamp to persist, or the existing one for an unchanged record.
    pub stamp: ApprovalStamp,
    /// Whether a write is needed.
    pub outcome: Outcome,
}

/// A decision that has been persisted (or confirmed as already present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Record the action targeted.
    pub record_id: String,
    /// Status before the action.
    pub previous: ApprovalStatus,
    /// Status after the action.
    pub status: ApprovalStatus,
    /// Who the stored decision belongs to.
    pub approved_by: String,
    /// When the stored decision was taken.
    pub approved_at: DateTime<Utc>,
    /// Whether anything was written.
    pub outcome: Outcome,
}

/// Work out the effect of `action` on `record` without touching storage.
///
/// # Errors
///
/// Returns `AppError::NotActionable` for ignored records.
pub fn decide(
    record: &FinancialRecord,
    action: ApprovalAction,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<Decision> {
    let previous = record.approval_status;
    let target = action.target_status();

    if previous == ApprovalStatus::Ignored {
        return Err(AppError::NotActionable(format!(
            "record {} is ignored",
            record.id
        )));
    }

    if previous == target && previous.is_decided() {
        if let (Some(by), Some(at)) = (record.approved_by.as_ref(), record.approved_at) {
            return Ok(Decision {
                previous,
                stamp: ApprovalStamp {
                    status: target,
                    approved_by: by.clone(),
                    approved_at: at,
                },
                outcome: Outcome::Unchanged,
            });
        }
        // A decided record without its stamp is repaired by re-stamping.
    }

    Ok(Decision {
        previous,
        stamp: ApprovalStamp {
            status: target,
            approved_by: actor.to_owned(),
            approved_at: now,
        },
        outcome: Outcome::Applied,
    })
}

/// Load the record, decide, and persist the decision.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the record does not exist (including
/// when it disappears between the read and the write),
/// `AppError::NotActionable` for ignored records, and `AppError::Db` for
/// store failures.
pub async fn apply(
    store: &dyn RecordStore,
    record_id: &str,
    action: ApprovalAction,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<Transition> {
    let record = store
        .get_record(record_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("record {record_id} not found")))?;

    let decision = decide(&record, action, actor, now)?;
    if decision.outcome == Outcome::Applied {
        store.set_approval(record_id, decision.stamp.clone()).await?;
        info!(
            record_id,
            previous = %decision.previous,
            status = %decision.stamp.status,
            actor,
            "approval status updated"
        );
    } else {
        info!(record_id, status = %decision.stamp.status, "approval already recorded");
    }

    Ok(Transition {
        record_id: record_id.to_owned(),
        previous: decision.previous,
        status: decision.stamp.status,
        approved_by: decision.stamp.approved_by,
        approved_at: decision.stamp.approved_at,
        outcome: decision.outcome,
    })
}
