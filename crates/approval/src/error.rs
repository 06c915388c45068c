//! Engine errors

use strum_macros::Display;
use thiserror::Error;
use trinetra_core::{Address, AmountError, TokenAmount};
use trinetra_ledger::LedgerError;

/// Which workflow a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RequestKind {
    Transfer,
    Burn,
}

/// Errors from the authorization engine
///
/// Every error leaves the engine untouched, except `BalanceChanged`
/// (see [`EngineError::is_state_changing`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: &'static str },

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        account: Address,
        available: TokenAmount,
        required: TokenAmount,
    },

    #[error("Sender balance changed, {kind} failed")]
    BalanceChanged {
        kind: RequestKind,
        id: u64,
        available: TokenAmount,
        required: TokenAmount,
    },

    #[error("Invalid state for {kind} request {id}: {reason}")]
    InvalidState {
        kind: RequestKind,
        id: u64,
        reason: &'static str,
    },

    #[error("{kind} request {id} not found")]
    NotFound { kind: RequestKind, id: u64 },

    #[error("Signer {signer} already approved {kind} request {id}")]
    DuplicateApproval {
        kind: RequestKind,
        id: u64,
        signer: Address,
    },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Required signatures must be at least 1")]
    InvalidQuorum,

    #[error("The administrator cannot be added to or removed from the signer set")]
    AdministratorRole,

    #[error("Engine already deployed")]
    AlreadyDeployed,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Replay diverged at sequence {sequence}: {reason}")]
    Replay { sequence: u64, reason: String },
}

impl EngineError {
    pub(crate) const ONLY_ADMIN_ADD: &'static str = "Only admin can add signers";
    pub(crate) const ONLY_ADMIN_REMOVE: &'static str = "Only admin can remove signers";
    pub(crate) const ONLY_SIGNERS: &'static str = "Only signers can approve";

    /// True when the failed call still changed engine state.
    ///
    /// Only a quorum-reaching approval that fails re-validation does this:
    /// the approval stays recorded and the request is left stalled.
    pub fn is_state_changing(&self) -> bool {
        matches!(self, EngineError::BalanceChanged { .. })
    }

    /// True for the Unauthorized family
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, EngineError::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_client_text() {
        let err = EngineError::Unauthorized {
            reason: EngineError::ONLY_SIGNERS,
        };
        assert_eq!(err.to_string(), "Unauthorized: Only signers can approve");

        let err = EngineError::BalanceChanged {
            kind: RequestKind::Transfer,
            id: 2,
            available: TokenAmount::new(500),
            required: TokenAmount::new(600),
        };
        assert_eq!(err.to_string(), "Sender balance changed, transfer failed");
        assert!(err.is_state_changing());
    }

    #[test]
    fn test_only_balance_changed_mutates() {
        let err = EngineError::NotFound {
            kind: RequestKind::Burn,
            id: 9,
        };
        assert!(!err.is_state_changing());
        assert_eq!(err.to_string(), "burn request 9 not found");
    }
}
