//! Transfer request mirror

use crate::error::IndexerError;
use crate::{STATUS_COMPLETED, STATUS_PENDING};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// One mirrored transfer request
///
/// A row created by an approval or completion that arrived before its
/// creation event is a placeholder: its request fields are empty until the
/// creation event fills them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRow {
    pub id: u64,
    pub from: String,
    pub to: String,
    /// Smallest-unit amount
    pub amount: String,
    /// Amount in whole-token units
    pub amount_units: String,
    pub attachment_ref: String,
    pub status: String,
    pub approval_count: u32,
    pub approvers: Vec<String>,
    pub created_seq: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl TransferRow {
    pub fn is_placeholder(&self) -> bool {
        self.from.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    fn from_row(row: &SqliteRow) -> Result<Self, IndexerError> {
        let approvers: String = row.get("approvers");
        Ok(Self {
            id: row.get::<i64, _>("id") as u64,
            from: row.get("from_account"),
            to: row.get("to_account"),
            amount: row.get("amount"),
            amount_units: row.get("amount_units"),
            attachment_ref: row.get("attachment_ref"),
            status: row.get("status"),
            approval_count: row.get::<i64, _>("approval_count") as u32,
            approvers: serde_json::from_str(&approvers)?,
            created_seq: row.get::<i64, _>("created_seq") as u64,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Fields carried by a `TransferRequestCreated` event
pub struct NewTransfer<'a> {
    pub id: u64,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub amount_units: String,
    pub attachment_ref: &'a str,
}

/// Transfer mirror - tracks transfer requests from events
pub struct TransferMirror {
    pool: SqlitePool,
}

impl TransferMirror {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transfer_requests (
                id INTEGER PRIMARY KEY,
                from_account TEXT NOT NULL DEFAULT '',
                to_account TEXT NOT NULL DEFAULT '',
                amount TEXT NOT NULL DEFAULT '0',
                amount_units TEXT NOT NULL DEFAULT '0',
                attachment_ref TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'Pending',
                approval_count INTEGER NOT NULL DEFAULT 0,
                approvers TEXT NOT NULL DEFAULT '[]',
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
            CREATE INDEX IF NOT EXISTS idx_transfer_requests_status
            ON transfer_requests(status, created_seq)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a created request, filling a placeholder if one exists
    ///
    /// Status and approvals are left alone so a late creation event never
    /// rolls back progress.
    pub async fn created(
        &self,
        transfer: NewTransfer<'_>,
        sequence: u64,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO transfer_requests
                (id, from_account, to_account, amount, amount_units, attachment_ref, status, created_seq, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                from_account = excluded.from_account,
                to_account = excluded.to_account,
                amount = excluded.amount,
                amount_units = excluded.amount_units,
                attachment_ref = excluded.attachment_ref,
                created_seq = excluded.created_seq,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(transfer.id as i64)
        .bind(&transfer.from)
        .bind(&transfer.to)
        .bind(&transfer.amount)
        .bind(&transfer.amount_units)
        .bind(transfer.attachment_ref)
        .bind(STATUS_PENDING)
        .bind(sequence as i64)
        .bind(at.to_rfc3339())
        .bind(at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = transfer.id, "Mirrored transfer request");
        Ok(())
    }

    /// Add a signer to the approver list; repeated signers are ignored
    pub async fn approved(&self, id: u64, signer: &str, at: DateTime<Utc>) -> Result<(), IndexerError> {
        let mut tx = self.pool.begin().await?;
        Self::ensure_row(&mut tx, id, at).await?;

        let approvers: String = sqlx::query("SELECT approvers FROM transfer_requests WHERE id = ?")
            .bind(id as i64)
            .fetch_one(&mut *tx)
            .await?
            .get("approvers");
        let mut approvers: Vec<String> = serde_json::from_str(&approvers)?;

        if !approvers.iter().any(|a| a == signer) {
            approvers.push(signer.to_string());
            sqlx::query(
                r#"
                UPDATE transfer_requests
                SET approvers = ?, approval_count = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(serde_json::to_string(&approvers)?)
            .bind(approvers.len() as i64)
            .bind(at.to_rfc3339())
            .bind(id as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Mark a request completed
    pub async fn completed(&self, id: u64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        Self::ensure_row(&mut tx, id, at).await?;

        sqlx::query("UPDATE transfer_requests SET status = ?, updated_at = ? WHERE id = ?")
            .bind(STATUS_COMPLETED)
            .bind(at.to_rfc3339())
            .bind(id as i64)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(id, "Mirrored transfer completion");
        Ok(())
    }

    async fn ensure_row(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        id: u64,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO transfer_requests (id, created_at, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(id as i64)
        .bind(at.to_rfc3339())
        .bind(at.to_rfc3339())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Fetch one request
    pub async fn get(&self, id: u64) -> Result<Option<TransferRow>, IndexerError> {
        let row = sqlx::query("SELECT * FROM transfer_requests WHERE id = ?")
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(TransferRow::from_row).transpose()
    }

    /// Requests with the given status, most recently created first
    pub async fn by_status(&self, status: &str) -> Result<Vec<TransferRow>, IndexerError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transfer_requests
            WHERE status = ?
            ORDER BY created_seq DESC, id DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(TransferRow::from_row).collect()
    }

    /// Clear all requests (for replay)
    pub async fn clear(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM transfer_requests")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
