//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS`, so the bootstrap
//! runs on every server startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table definitions to the connected `SQLite` database.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS financial_record (
    seq             INTEGER PRIMARY KEY AUTOINCREMENT,
    id              TEXT NOT NULL UNIQUE,
    kind            TEXT NOT NULL CHECK(kind IN ('income','expense')),
    amount          TEXT NOT NULL,
    category        TEXT NOT NULL,
    payer           TEXT,
    payee           TEXT,
    creator         TEXT NOT NULL,
    project         TEXT,
    stage           TEXT,
    comment         TEXT,
    created_at      TEXT NOT NULL,
    approval_status TEXT NOT NULL CHECK(approval_status IN ('pending','approved','rejected','ignored')),
    approved_by     TEXT,
    approved_at     TEXT,
    CHECK ((approval_status IN ('approved','rejected')) = (approved_by IS NOT NULL AND approved_at IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS idx_financial_record_status
    ON financial_record(approval_status);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
