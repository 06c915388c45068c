//! Token metadata fixed at deployment

use crate::amount::DEFAULT_DECIMALS;
use serde::{Deserialize, Serialize};

/// Name, symbol and decimals of the governed token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "GovtProjectToken".to_string(),
            symbol: "GPT".to_string(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}
