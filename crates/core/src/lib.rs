//! Trinetra Core - Domain types
//!
//! This crate contains the fundamental types used across Trinetra:
//! - `Address`: Opaque fixed-length account identifier
//! - `TokenAmount`: Non-negative integer amount in the token's smallest unit
//! - `TokenMetadata`: Name, symbol and decimals of the token

pub mod address;
pub mod amount;
pub mod token;

pub use address::{Address, AddressError};
pub use amount::{AmountError, TokenAmount, DEFAULT_DECIMALS};
pub use token::TokenMetadata;
