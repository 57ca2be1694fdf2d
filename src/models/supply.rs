//! Supply request model announced to admin chats.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a supply request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SupplyItem {
    /// Item name.
    pub name: String,
    /// Requested quantity.
    pub quantity: Decimal,
    /// Unit of measure (pcs, kg, m, ...).
    #[serde(default)]
    pub unit: Option<String>,
}

/// A field request for materials or equipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SupplyRequest {
    /// Opaque identifier.
    pub id: String,
    /// Person asking for the supplies.
    pub requester: String,
    /// Project the supplies are for.
    pub project: String,
    /// Delivery location.
    #[serde(default)]
    pub location: Option<String>,
    /// Requested items.
    pub items: Vec<SupplyItem>,
    /// Date the supplies are needed by.
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// Free-text note.
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation timestamp.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl SupplyRequest {
    /// Construct a new supply request with a fresh identifier.
    #[must_use]
    pub fn new(requester: String, project: String, items: Vec<SupplyItem>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            requester,
            project,
            location: None,
            items,
            deadline: None,
            comment: None,
            created_at: Utc::now(),
        }
    }
}
