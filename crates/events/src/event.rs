//! Events emitted by the authorization engine

use serde::{Deserialize, Serialize};
use trinetra_core::{Address, TokenAmount};

/// Engine events, one per state transition
///
/// The field layout matches what the indexer consumes; `BurnRequestApproved`
/// fires on completion only, while `TransferApproved` fires per recorded approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum EngineEvent {
    /// A transfer request was created
    TransferRequestCreated {
        id: u64,
        from: Address,
        to: Address,
        amount: TokenAmount,
        attachment_ref: String,
    },

    /// A signer approved a transfer request
    TransferApproved { id: u64, signer: Address },

    /// A transfer request reached quorum and settled
    TransferCompleted { id: u64 },

    /// A burn request was created
    BurnRequestCreated {
        id: u64,
        from: Address,
        amount: TokenAmount,
        bank_details: String,
    },

    /// A burn request reached quorum and the tokens were destroyed
    BurnRequestApproved {
        id: u64,
        from: Address,
        amount: TokenAmount,
        bank_details: String,
    },
}

impl EngineEvent {
    /// Event name as seen by subscribers
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::TransferRequestCreated { .. } => "TransferRequestCreated",
            EngineEvent::TransferApproved { .. } => "TransferApproved",
            EngineEvent::TransferCompleted { .. } => "TransferCompleted",
            EngineEvent::BurnRequestCreated { .. } => "BurnRequestCreated",
            EngineEvent::BurnRequestApproved { .. } => "BurnRequestApproved",
        }
    }

    /// Id of the request this event belongs to
    pub fn request_id(&self) -> u64 {
        match self {
            EngineEvent::TransferRequestCreated { id, .. }
            | EngineEvent::TransferApproved { id, .. }
            | EngineEvent::TransferCompleted { id }
            | EngineEvent::BurnRequestCreated { id, .. }
            | EngineEvent::BurnRequestApproved { id, .. } => *id,
        }
    }

    /// True for events of the burn workflow
    pub fn is_burn(&self) -> bool {
        matches!(
            self,
            EngineEvent::BurnRequestCreated { .. } | EngineEvent::BurnRequestApproved { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged_by_name() {
        let event = EngineEvent::TransferCompleted { id: 7 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "TransferCompleted");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn test_request_id_and_kind() {
        let event = EngineEvent::BurnRequestCreated {
            id: 3,
            from: Address::from_label("user1"),
            amount: TokenAmount::new(200),
            bank_details: "SBI, Account: 12345".to_string(),
        };
        assert_eq!(event.request_id(), 3);
        assert!(event.is_burn());
        assert_eq!(event.name(), "BurnRequestCreated");

        let approved = EngineEvent::TransferApproved {
            id: 2,
            signer: Address::from_label("signer1"),
        };
        assert!(!approved.is_burn());
    }
}
