//! Trinetra Ledger - Token balances and total supply
//!
//! Every balance mutation in Trinetra goes through this crate.
//!
//! # Key Types
//! - `TokenLedger`: Account balances plus total supply
//! - `SupplyAudit`: Result of recomputing the supply from balances

pub mod error;
pub mod state;

pub use error::LedgerError;
pub use state::{SupplyAudit, TokenLedger};
