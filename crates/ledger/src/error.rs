//! Ledger errors

use thiserror::Error;
use trinetra_core::{Address, TokenAmount};

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance for {account}: available {available}, required {required}")]
    InsufficientBalance {
        account: Address,
        available: TokenAmount,
        required: TokenAmount,
    },

    #[error("Balance overflow for {0}")]
    Overflow(Address),

    #[error("Burn of {amount} exceeds total supply {supply}")]
    SupplyUnderflow {
        amount: TokenAmount,
        supply: TokenAmount,
    },

    #[error("Supply mismatch: balances sum to {balances}, total supply is {supply}")]
    SupplyMismatch {
        balances: TokenAmount,
        supply: TokenAmount,
    },
}
