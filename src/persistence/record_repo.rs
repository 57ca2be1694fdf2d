//! Financial record repository for `SQLite` persistence.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::approval::ApprovalStatus;
use crate::models::record::{FinancialRecord, RecordKind};
use crate::{AppError, Result};

use super::db::Database;
use super::{ApprovalStamp, RecordStore, StoreFuture};

/// Repository wrapper around `SQLite` for financial records.
#[derive(Clone)]
pub struct RecordRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct RecordRow {
    id: String,
    kind: String,
    amount: String,
    category: String,
    payer: Option<String>,
    payee: Option<String>,
    creator: String,
    project: Option<String>,
    stage: Option<String>,
    comment: Option<String>,
    created_at: String,
    approval_status: String,
    approved_by: Option<String>,
    approved_at: Option<String>,
}

impl RecordRow {
    /// Convert a database row into the domain model.
    fn into_record(self) -> Result<FinancialRecord> {
        let kind = parse_kind(&self.kind)?;
        let amount = Decimal::from_str(&self.amount)
            .map_err(|e| AppError::Db(format!("invalid amount '{}': {e}", self.amount)))?;
        let approval_status = ApprovalStatus::from_str(&self.approval_status).map_err(AppError::Db)?;
        let created_at = parse_timestamp(&self.created_at, "created_at")?;
        let approved_at = self
            .approved_at
            .as_deref()
            .map(|s| parse_timestamp(s, "approved_at"))
            .transpose()?;

        Ok(FinancialRecord {
            id: self.id,
            kind,
            amount,
            category: self.category,
            payer: self.payer,
            payee: self.payee,
            creator: self.creator,
            project: self.project,
            stage: self.stage,
            comment: self.comment,
            created_at,
            approval_status,
            approved_by: self.approved_by,
            approved_at,
        })
    }
}

fn parse_kind(s: &str) -> Result<RecordKind> {
    match s {
        "income" => Ok(RecordKind::Income),
        "expense" => Ok(RecordKind::Expense),
        other => Err(AppError::Db(format!("invalid record kind: {other}"))),
    }
}

fn parse_timestamp(s: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

const SELECT_COLUMNS: &str = "SELECT id, kind, amount, category, payer, payee, creator, project, \
     stage, comment, created_at, approval_status, approved_by, approved_at FROM financial_record";

impl RecordRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new record. Fails if the id already exists.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(&self, record: &FinancialRecord) -> Result<FinancialRecord> {
        sqlx::query(
            "INSERT INTO financial_record (id, kind, amount, category, payer, payee, creator,
             project, stage, comment, created_at, approval_status, approved_by, approved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&record.id)
        .bind(record.kind.as_str())
        .bind(record.amount.to_string())
        .bind(&record.category)
        .bind(&record.payer)
        .bind(&record.payee)
        .bind(&record.creator)
        .bind(&record.project)
        .bind(&record.stage)
        .bind(&record.comment)
        .bind(record.created_at.to_rfc3339())
        .bind(record.approval_status.as_str())
        .bind(&record.approved_by)
        .bind(record.approved_at.map(|dt| dt.to_rfc3339()))
        .execute(self.db.as_ref())
        .await?;

        Ok(record.clone())
    }

    /// Retrieve a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<FinancialRecord>> {
        let row: Option<RecordRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(RecordRow::into_record).transpose()
    }

    /// List every record in creation order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<FinancialRecord>> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY seq ASC"))
            .fetch_all(self.db.as_ref())
            .await?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }

    /// Write a decided approval status together with its stamp.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the record does not exist.
    /// Returns `AppError::Db` if the update fails.
    pub async fn update_approval(&self, id: &str, stamp: &ApprovalStamp) -> Result<()> {
        let result = sqlx::query(
            "UPDATE financial_record SET approval_status = ?1, approved_by = ?2, approved_at = ?3
             WHERE id = ?4",
        )
        .bind(stamp.status.as_str())
        .bind(&stamp.approved_by)
        .bind(stamp.approved_at.to_rfc3339())
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("record {id} not found")));
        }
        Ok(())
    }

    /// Mark a record as ignored, clearing any decision stamp.
    ///
    /// This is host-application logic; the bot itself never ignores records.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the record does not exist.
    /// Returns `AppError::Db` if the update fails.
    pub async fn mark_ignored(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE financial_record SET approval_status = 'ignored', approved_by = NULL,
             approved_at = NULL WHERE id = ?1",
        )
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("record {id} not found")));
        }
        Ok(())
    }

    /// Insert the record unless its id already exists; return the stored copy.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert or the follow-up read fails.
    pub async fn insert_if_absent(&self, record: &FinancialRecord) -> Result<FinancialRecord> {
        if let Some(existing) = self.get_by_id(&record.id).await? {
            return Ok(existing);
        }
        self.create(record).await
    }
}

impl RecordStore for RecordRepo {
    fn list_records(&self) -> StoreFuture<'_, Vec<FinancialRecord>> {
        Box::pin(self.list_all())
    }

    fn get_record(&self, id: &str) -> StoreFuture<'_, Option<FinancialRecord>> {
        let id = id.to_owned();
        Box::pin(async move { self.get_by_id(&id).await })
    }

    fn set_approval(&self, id: &str, stamp: ApprovalStamp) -> StoreFuture<'_, ()> {
        let id = id.to_owned();
        Box::pin(async move { self.update_approval(&id, &stamp).await })
    }

    fn insert_record(&self, record: FinancialRecord) -> StoreFuture<'_, FinancialRecord> {
        Box::pin(async move { self.insert_if_absent(&record).await })
    }
}
