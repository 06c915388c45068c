//! Journaled engine commands

use crate::event::EngineEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trinetra_core::{Address, TokenAmount, TokenMetadata};

/// A state-changing engine operation, as written to the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EngineCommand {
    /// Construct the engine. Always the first record.
    Deploy {
        administrator: Address,
        /// Whole tokens, scaled by `token.decimals`
        initial_supply: u64,
        required_signatures: u32,
        token: TokenMetadata,
    },
    AddSigner {
        candidate: Address,
    },
    RemoveSigner {
        target: Address,
    },
    InitiateTransfer {
        to: Address,
        amount: TokenAmount,
        attachment_ref: String,
    },
    ApproveTransfer {
        id: u64,
    },
    InitiateBurn {
        amount: TokenAmount,
        bank_details: String,
    },
    ApproveBurn {
        id: u64,
    },
}

impl EngineCommand {
    pub fn name(&self) -> &'static str {
        match self {
            EngineCommand::Deploy { .. } => "deploy",
            EngineCommand::AddSigner { .. } => "add_signer",
            EngineCommand::RemoveSigner { .. } => "remove_signer",
            EngineCommand::InitiateTransfer { .. } => "initiate_transfer",
            EngineCommand::ApproveTransfer { .. } => "approve_transfer",
            EngineCommand::InitiateBurn { .. } => "initiate_burn",
            EngineCommand::ApproveBurn { .. } => "approve_burn",
        }
    }
}

/// One line of the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    /// Strictly increasing, starting at 1 with the deploy record
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub caller: Address,
    pub command: EngineCommand,
    /// Events the command emitted, in order
    #[serde(default)]
    pub events: Vec<EngineEvent>,
    /// Error text when the command failed but still changed state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl JournalRecord {
    pub fn new(
        sequence: u64,
        caller: Address,
        command: EngineCommand,
        events: Vec<EngineEvent>,
        failure: Option<String>,
    ) -> Self {
        Self {
            sequence,
            timestamp: Utc::now(),
            caller,
            command,
            events,
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_tagged() {
        let cmd = EngineCommand::ApproveBurn { id: 4 };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["op"], "approve_burn");
        assert_eq!(cmd.name(), "approve_burn");
    }

    #[test]
    fn test_failure_omitted_when_none() {
        let record = JournalRecord::new(
            2,
            Address::from_label("admin"),
            EngineCommand::AddSigner {
                candidate: Address::from_label("signer1"),
            },
            vec![],
            None,
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("failure"));
    }
}
