//! Admin allow-list consulted before any privileged bot action.
//!
//! The set is built once from configuration and never mutated, so it is
//! shared read-only across concurrent webhook handlers. Every lookup fails
//! closed: a missing, malformed, or unknown identifier is unauthorized.

use std::collections::HashSet;

/// Immutable set of chat identifiers permitted to approve, reject, and
/// list the pending queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminSet {
    ids: HashSet<i64>,
}

impl AdminSet {
    /// Build the set from configured chat identifiers.
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Whether `id` belongs to an admin chat. `None` is never authorized.
    #[must_use]
    pub fn is_authorized(&self, id: Option<i64>) -> bool {
        id.is_some_and(|id| self.ids.contains(&id))
    }

    /// Same check for an identifier that has not been parsed yet.
    #[must_use]
    pub fn is_authorized_raw(&self, raw: &str) -> bool {
        self.is_authorized(raw.trim().parse::<i64>().ok())
    }

    /// Admin chat identifiers in ascending order, for fan-out announcements.
    #[must_use]
    pub fn chat_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of admin chats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no admin chat is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
