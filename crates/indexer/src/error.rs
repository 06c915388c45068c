//! Indexer errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt approver list: {0}")]
    Approvers(#[from] serde_json::Error),

    #[error("Amount error: {0}")]
    Amount(#[from] trinetra_core::AmountError),
}
