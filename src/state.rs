//! Shared application state injected into every webhook handler.

use std::future::Future;
use std::sync::Arc;

use crate::auth::AdminSet;
use crate::config::GlobalConfig;
use crate::persistence::RecordStore;
use crate::telegram::notifier::Notifier;
use crate::telegram::ChatPlatform;
use crate::{AppError, Result};

/// Read-only state built once at start-up.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Chats allowed to issue admin actions.
    pub admins: AdminSet,
    /// Outbound message layer.
    pub notifier: Notifier,
    /// Record store the approval decisions are written to.
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    /// Assemble state from its parts, deriving the admin set from config.
    #[must_use]
    pub fn new(
        config: Arc<GlobalConfig>,
        platform: Arc<dyn ChatPlatform>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        let admins = AdminSet::new(config.telegram.admin_chat_ids.iter().copied());
        let notifier = Notifier::new(platform, config.currency.clone());
        Self {
            config,
            admins,
            notifier,
            store,
        }
    }

    /// Run a record store operation under the configured store timeout.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, or `AppError::Db` when it does
    /// not finish in time.
    pub async fn with_store_timeout<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limit = self.config.store_timeout();
        tokio::time::timeout(limit, op).await.map_err(|_| {
            AppError::Db(format!("record store timed out after {}s", limit.as_secs()))
        })?
    }
}
