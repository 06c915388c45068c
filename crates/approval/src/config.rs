//! Engine construction parameters

use serde::{Deserialize, Serialize};
use trinetra_core::{Address, TokenMetadata};
use trinetra_events::EngineCommand;

/// Parameters fixed at deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sole account allowed to manage signers; receives the initial supply
    pub administrator: Address,

    /// Initial supply in whole tokens (scaled by `token.decimals`)
    pub initial_supply: u64,

    /// Distinct signer approvals needed to settle a request
    pub required_signatures: u32,

    #[serde(default)]
    pub token: TokenMetadata,
}

impl EngineConfig {
    pub fn new(administrator: Address, initial_supply: u64, required_signatures: u32) -> Self {
        Self {
            administrator,
            initial_supply,
            required_signatures,
            token: TokenMetadata::default(),
        }
    }

    /// Journal form of this configuration
    pub fn to_command(&self) -> EngineCommand {
        EngineCommand::Deploy {
            administrator: self.administrator,
            initial_supply: self.initial_supply,
            required_signatures: self.required_signatures,
            token: self.token.clone(),
        }
    }
}
