//! Burn request mirror

use crate::error::IndexerError;
use crate::{STATUS_COMPLETED, STATUS_PENDING};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// One mirrored burn request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BurnRow {
    pub id: u64,
    pub from: String,
    pub amount: String,
    pub amount_units: String,
    pub bank_details: String,
    pub status: String,
    pub created_seq: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl BurnRow {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get::<i64, _>("id") as u64,
            from: row.get("from_account"),
            amount: row.get("amount"),
            amount_units: row.get("amount_units"),
            bank_details: row.get("bank_details"),
            status: row.get("status"),
            created_seq: row.get::<i64, _>("created_seq") as u64,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// Fields shared by `BurnRequestCreated` and `BurnRequestApproved`
pub struct BurnFields<'a> {
    pub id: u64,
    pub from: String,
    pub amount: String,
    pub amount_units: String,
    pub bank_details: &'a str,
}

/// Burn mirror - tracks burn requests from events
pub struct BurnMirror {
    pool: SqlitePool,
}

impl BurnMirror {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS burn_requests (
                id INTEGER PRIMARY KEY,
                from_account TEXT NOT NULL,
                amount TEXT NOT NULL,
                amount_units TEXT NOT NULL,
                bank_details TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'Pending',
                created_seq INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_burn_requests_status
            ON burn_requests(status, created_seq)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a created burn; never downgrades a completed row
    pub async fn created(&self, burn: BurnFields<'_>, sequence: u64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO burn_requests
                (id, from_account, amount, amount_units, bank_details, status, created_seq, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                from_account = excluded.from_account,
                amount = excluded.amount,
                amount_units = excluded.amount_units,
                bank_details = excluded.bank_details,
                created_seq = excluded.created_seq,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(burn.id as i64)
        .bind(&burn.from)
        .bind(&burn.amount)
        .bind(&burn.amount_units)
        .bind(burn.bank_details)
        .bind(STATUS_PENDING)
        .bind(sequence as i64)
        .bind(at.to_rfc3339())
        .bind(at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = burn.id, "Mirrored burn request");
        Ok(())
    }

    /// Mark a burn completed
    ///
    /// The completion event carries every request field, so an early
    /// completion creates a full row rather than a placeholder.
    pub async fn completed(&self, burn: BurnFields<'_>, sequence: u64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO burn_requests
                (id, from_account, amount, amount_units, bank_details, status, created_seq, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                bank_details = excluded.bank_details,
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(burn.id as i64)
        .bind(&burn.from)
        .bind(&burn.amount)
        .bind(&burn.amount_units)
        .bind(burn.bank_details)
        .bind(STATUS_COMPLETED)
        .bind(sequence as i64)
        .bind(at.to_rfc3339())
        .bind(at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = burn.id, "Mirrored burn completion");
        Ok(())
    }

    /// Fetch one burn
    pub async fn get(&self, id: u64) -> Result<Option<BurnRow>, IndexerError> {
        let row = sqlx::query("SELECT * FROM burn_requests WHERE id = ?")
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(BurnRow::from_row))
    }

    /// Burns with the given status, most recently created first
    pub async fn by_status(&self, status: &str) -> Result<Vec<BurnRow>, IndexerError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM burn_requests
            WHERE status = ?
            ORDER BY created_seq DESC, id DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(BurnRow::from_row).collect())
    }

    /// Clear all burns (for replay)
    pub async fn clear(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM burn_requests").execute(&self.pool).await?;
        Ok(())
    }
}
