//! Address - Opaque fixed-length account identifier
//!
//! The engine never inspects an address beyond equality. The hex form
//! (`0x` + 40 lowercase hex chars) is only used at the edges (CLI, JSON, SQL).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

/// Errors that can occur when parsing addresses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid hex in address: {0}")]
    InvalidHex(String),
}

/// Account identifier
///
/// # Examples
/// ```
/// use trinetra_core::Address;
///
/// let admin: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
/// assert_eq!(admin.to_string(), "0x00000000000000000000000000000000000000aa");
///
/// // Deterministic addresses for named accounts
/// assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
/// assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Create an address from raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a stable address from a human label (first 20 bytes of SHA-256)
    pub fn from_label(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(bytes)
    }

    /// Shortened form for log lines (`0x1234…abcd`)
    pub fn short(&self) -> String {
        let hex = hex::encode(self.0);
        format!("0x{}…{}", &hex[..4], &hex[hex.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let decoded = hex::decode(digits).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        let bytes: [u8; ADDRESS_LEN] =
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: ADDRESS_LEN,
                    actual: decoded.len(),
                })?;

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}
