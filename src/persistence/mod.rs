//! Record store seam and its `SQLite` implementation.
//!
//! The bot never owns financial records; it reads them and writes the
//! approval projection back. [`RecordStore`] is the only surface the
//! dispatcher and the approval state machine see, so tests and alternate
//! back ends can stand in for the host application's database.

pub mod db;
pub mod record_repo;
pub mod schema;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::models::approval::ApprovalStatus;
use crate::models::record::FinancialRecord;
use crate::Result;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;

/// Boxed future returned by [`RecordStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Approval projection written back to the store after a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalStamp {
    /// Decided status; always `Approved` or `Rejected`.
    pub status: ApprovalStatus,
    /// Who decided.
    pub approved_by: String,
    /// When the decision was taken.
    pub approved_at: DateTime<Utc>,
}

/// Read/update access to approvable records.
pub trait RecordStore: Send + Sync {
    /// All records in store order (creation order).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    fn list_records(&self) -> StoreFuture<'_, Vec<FinancialRecord>>;

    /// A single record, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    fn get_record(&self, id: &str) -> StoreFuture<'_, Option<FinancialRecord>>;

    /// Overwrite the approval projection of a record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no record with `id` exists and
    /// `AppError::Db` if the write fails.
    fn set_approval(&self, id: &str, stamp: ApprovalStamp) -> StoreFuture<'_, ()>;

    /// Insert a record handed over by the host application. Inserting an
    /// id that already exists leaves the stored record untouched and
    /// returns the stored copy.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    fn insert_record(&self, record: FinancialRecord) -> StoreFuture<'_, FinancialRecord>;
}
