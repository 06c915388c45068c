//! Transfer and burn request records

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use trinetra_core::{Address, TokenAmount};

/// Status of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum RequestStatus {
    /// Awaiting approvals (or stalled, see [`Approvals::is_stalled`])
    Pending,
    /// Quorum reached and the balance mutation committed
    Completed,
}

/// Result of a successful approval call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Approval recorded, quorum not reached yet
    Recorded { approvals: usize, required: u32 },
    /// This approval reached quorum and the request settled
    Completed,
}

/// Distinct signers that approved a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approvals {
    signers: Vec<Address>,
}

impl Approvals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.signers.len()
    }

    pub fn contains(&self, signer: &Address) -> bool {
        self.signers.contains(signer)
    }

    /// Signers in the order they approved
    pub fn signers(&self) -> &[Address] {
        &self.signers
    }

    /// Record a signer. Returns false if already present.
    pub(crate) fn record(&mut self, signer: Address) -> bool {
        if self.contains(&signer) {
            return false;
        }
        self.signers.push(signer);
        true
    }

    /// Count this request would reach with one more approval
    pub(crate) fn next_count(&self) -> usize {
        self.signers.len() + 1
    }

    pub fn has_quorum(&self, required: u32) -> bool {
        self.count() >= required as usize
    }

    /// Number of approvals still missing
    pub fn remaining(&self, required: u32) -> usize {
        (required as usize).saturating_sub(self.count())
    }
}

/// A request to move tokens between two accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub id: u64,
    pub from: Address,
    pub to: Address,
    pub amount: TokenAmount,
    /// Content hash of the supporting document
    pub attachment_ref: String,
    pub approvals: Approvals,
    pub status: RequestStatus,
}

impl TransferRequest {
    pub(crate) fn new(
        id: u64,
        from: Address,
        to: Address,
        amount: TokenAmount,
        attachment_ref: String,
    ) -> Self {
        Self {
            id,
            from,
            to,
            amount,
            attachment_ref,
            approvals: Approvals::new(),
            status: RequestStatus::Pending,
        }
    }

    /// Pending with a full quorum: the final re-validation failed and
    /// the request can no longer complete
    pub fn is_stalled(&self, required: u32) -> bool {
        self.status == RequestStatus::Pending && self.approvals.has_quorum(required)
    }
}

/// A request to destroy tokens for off-ledger settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRequest {
    pub id: u64,
    pub from: Address,
    pub amount: TokenAmount,
    /// Where the off-ledger payout goes
    pub bank_details: String,
    pub approvals: Approvals,
    pub status: RequestStatus,
}

impl BurnRequest {
    pub(crate) fn new(id: u64, from: Address, amount: TokenAmount, bank_details: String) -> Self {
        Self {
            id,
            from,
            amount,
            bank_details,
            approvals: Approvals::new(),
            status: RequestStatus::Pending,
        }
    }

    /// See [`TransferRequest::is_stalled`]
    pub fn is_stalled(&self, required: u32) -> bool {
        self.status == RequestStatus::Pending && self.approvals.has_quorum(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn test_approvals_count_distinct_signers() {
        let mut approvals = Approvals::new();
        assert!(approvals.record(addr("signer1")));
        assert!(!approvals.record(addr("signer1")));
        assert!(approvals.record(addr("signer2")));

        assert_eq!(approvals.count(), 2);
        assert_eq!(approvals.signers(), &[addr("signer1"), addr("signer2")]);
    }

    #[test]
    fn test_remaining_and_quorum() {
        let mut approvals = Approvals::new();
        assert_eq!(approvals.remaining(2), 2);
        assert!(!approvals.has_quorum(2));

        approvals.record(addr("signer1"));
        assert_eq!(approvals.remaining(2), 1);
        assert_eq!(approvals.next_count(), 2);

        approvals.record(addr("signer2"));
        assert_eq!(approvals.remaining(2), 0);
        assert!(approvals.has_quorum(2));
    }

    #[test]
    fn test_stalled_only_while_pending() {
        let mut request = TransferRequest::new(
            1,
            addr("user1"),
            addr("user2"),
            TokenAmount::new(10),
            "bill".to_string(),
        );
        request.approvals.record(addr("signer1"));
        assert!(!request.is_stalled(2));

        request.approvals.record(addr("signer2"));
        assert!(request.is_stalled(2));

        request.status = RequestStatus::Completed;
        assert!(!request.is_stalled(2));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(RequestStatus::Pending.to_string(), "Pending");
        assert_eq!("Completed".parse::<RequestStatus>().unwrap(), RequestStatus::Completed);
    }
}
