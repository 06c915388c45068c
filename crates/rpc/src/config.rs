//! Deployment configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use trinetra_approval::EngineConfig;
use trinetra_core::{Address, TokenAmount, TokenMetadata};

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("config file not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("validation error: {0}")]
    Validation(String),
}

/// Deployment parameters
///
/// ```toml
/// administrator = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
/// initial_supply = 1000000
/// required_signatures = 2
/// signers = ["0x70997970c51812dc3a010c7d01b50e0d17dc79c8"]
///
/// [token]
/// name = "GovtProjectToken"
/// symbol = "GPT"
/// decimals = 18
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    pub administrator: Address,
    /// Whole tokens minted to the administrator
    pub initial_supply: u64,
    pub required_signatures: u32,
    /// Signers added right after deployment
    #[serde(default)]
    pub signers: Vec<Address>,
    #[serde(default)]
    pub token: TokenMetadata,
}

impl DeployConfig {
    pub fn new(administrator: Address, initial_supply: u64, required_signatures: u32) -> Self {
        Self {
            administrator,
            initial_supply,
            required_signatures,
            signers: Vec::new(),
            token: TokenMetadata::default(),
        }
    }

    /// Load and validate a TOML file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load and validate TOML text
    pub fn load_str(content: &str) -> Result<Self, ConfigError> {
        let config: DeployConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.required_signatures == 0 {
            return Err(ConfigError::Validation(
                "required_signatures must be at least 1".to_string(),
            ));
        }

        if self.token.name.trim().is_empty() || self.token.symbol.trim().is_empty() {
            return Err(ConfigError::Validation(
                "token name and symbol must not be empty".to_string(),
            ));
        }

        TokenAmount::from_whole(u128::from(self.initial_supply), self.token.decimals).map_err(|e| {
            ConfigError::Validation(format!(
                "initial_supply {} with {} decimals: {}",
                self.initial_supply, self.token.decimals, e
            ))
        })?;

        if self.signers.contains(&self.administrator) {
            return Err(ConfigError::Validation(
                "the administrator cannot be listed as a signer".to_string(),
            ));
        }

        let quorum = self.required_signatures as usize;
        let distinct = {
            let mut signers = self.signers.clone();
            signers.sort();
            signers.dedup();
            signers.len()
        };
        if !self.signers.is_empty() && distinct < quorum {
            return Err(ConfigError::Validation(format!(
                "{} signer(s) listed but {} approvals required",
                distinct, quorum
            )));
        }

        Ok(())
    }

    /// Engine parameters (signers are added as separate journaled commands)
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            administrator: self.administrator,
            initial_supply: self.initial_supply,
            required_signatures: self.required_signatures,
            token: self.token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        Address::from_label("admin")
    }

    #[test]
    fn test_load_full_config() {
        let toml = format!(
            r#"
            administrator = "{}"
            initial_supply = 1000000
            required_signatures = 2
            signers = ["{}", "{}"]

            [token]
            name = "CityBond"
            symbol = "CBT"
            decimals = 6
            "#,
            admin(),
            Address::from_label("signer1"),
            Address::from_label("signer2"),
        );

        let config = DeployConfig::load_str(&toml).unwrap();
        assert_eq!(config.administrator, admin());
        assert_eq!(config.signers.len(), 2);
        assert_eq!(config.token.symbol, "CBT");
        assert_eq!(config.engine_config().token.decimals, 6);
    }

    #[test]
    fn test_token_defaults() {
        let toml = format!(
            "administrator = \"{}\"\ninitial_supply = 10\nrequired_signatures = 1\n",
            admin()
        );
        let config = DeployConfig::load_str(&toml).unwrap();
        assert_eq!(config.token, TokenMetadata::default());
        assert!(config.signers.is_empty());
    }

    #[test]
    fn test_zero_quorum_rejected() {
        let config = DeployConfig::new(admin(), 10, 0);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_admin_as_signer_rejected() {
        let mut config = DeployConfig::new(admin(), 10, 1);
        config.signers.push(admin());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_too_few_signers_rejected() {
        let mut config = DeployConfig::new(admin(), 10, 3);
        config.signers = vec![Address::from_label("signer1"), Address::from_label("signer1")];
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unsupported_decimals_rejected() {
        let mut config = DeployConfig::new(admin(), 10, 1);
        config.token.decimals = 40;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = DeployConfig::load_file("/nonexistent/trinetra.toml");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_bad_address_is_parse_error() {
        let toml = "administrator = \"0xnothex\"\ninitial_supply = 1\nrequired_signatures = 1\n";
        assert!(matches!(DeployConfig::load_str(toml), Err(ConfigError::Parse(_))));
    }
}
