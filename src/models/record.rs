//! Financial record projection consumed from the record store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::approval::ApprovalStatus;

/// Direction of money movement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Money received.
    Income,
    /// Money spent; the usual subject of approval.
    #[default]
    Expense,
}

impl RecordKind {
    /// Stable lowercase name used in storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

/// A financial event whose lifecycle includes an approval decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FinancialRecord {
    /// Opaque record identifier assigned by the store.
    pub id: String,
    /// Income or expense.
    #[serde(default)]
    pub kind: RecordKind,
    /// Amount in the configured currency.
    pub amount: Decimal,
    /// Accounting category.
    pub category: String,
    /// Party paying the amount.
    #[serde(default)]
    pub payer: Option<String>,
    /// Party receiving the amount.
    #[serde(default)]
    pub payee: Option<String>,
    /// User who entered the record.
    pub creator: String,
    /// Related project, if any.
    #[serde(default)]
    pub project: Option<String>,
    /// Project stage, if any.
    #[serde(default)]
    pub stage: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation timestamp.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Current approval status.
    #[serde(default = "default_status")]
    pub approval_status: ApprovalStatus,
    /// Who decided, set only for approved or rejected records.
    #[serde(default)]
    pub approved_by: Option<String>,
    /// When the decision was taken, set only for approved or rejected records.
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

fn default_status() -> ApprovalStatus {
    ApprovalStatus::Pending
}

impl FinancialRecord {
    /// Construct a new pending record with a fresh identifier.
    #[must_use]
    pub fn new(kind: RecordKind, amount: Decimal, category: String, creator: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            amount,
            category,
            payer: None,
            payee: None,
            creator,
            project: None,
            stage: None,
            comment: None,
            created_at: Utc::now(),
            approval_status: ApprovalStatus::Pending,
            approved_by: None,
            approved_at: None,
        }
    }

    /// Whether the record is awaiting a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.approval_status == ApprovalStatus::Pending
    }
}
