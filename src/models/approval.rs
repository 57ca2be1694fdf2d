//! Approval vocabulary shared by the callback codec, the state machine,
//! and the record store.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status for an approvable record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting an admin decision.
    Pending,
    /// An admin approved the record.
    Approved,
    /// An admin rejected the record.
    Rejected,
    /// Set by the host application; the bot may no longer act on it.
    Ignored,
}

impl ApprovalStatus {
    /// Stable lowercase name used in storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Ignored => "ignored",
        }
    }

    /// Whether the record carries a decision stamp in this status.
    #[must_use]
    pub fn is_decided(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "ignored" => Ok(Self::Ignored),
            other => Err(format!("invalid approval status: {other}")),
        }
    }
}

impl Display for ApprovalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision an admin can take from an inline button.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    /// Approve the record.
    Approve,
    /// Reject the record.
    Reject,
}

impl ApprovalAction {
    /// Keyword carried in callback payloads.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    /// Status a record lands in after this action.
    #[must_use]
    pub fn target_status(self) -> ApprovalStatus {
        match self {
            Self::Approve => ApprovalStatus::Approved,
            Self::Reject => ApprovalStatus::Rejected,
        }
    }

    /// Parse a payload keyword. Matching is exact; callback data is echoed
    /// back verbatim by the platform, so any other spelling is foreign.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "approve" => Some(Self::Approve),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}
