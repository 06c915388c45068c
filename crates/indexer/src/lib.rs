//! Trinetra Indexer - Engine events to a SQLite request mirror
//!
//! The mirror is DISPOSABLE: it can be rebuilt from the journal at any time.
//! Every handler upserts by request id, so duplicate and out-of-order
//! delivery converge to the same rows.

pub mod burn;
pub mod engine;
pub mod error;
pub mod transfer;

pub use burn::{BurnMirror, BurnRow};
pub use engine::Indexer;
pub use error::IndexerError;
pub use transfer::{TransferMirror, TransferRow};

/// Mirror status for a request that is still collecting approvals
pub const STATUS_PENDING: &str = "Pending";
/// Mirror status once the completion event has been seen
pub const STATUS_COMPLETED: &str = "Completed";
