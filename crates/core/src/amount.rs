//! TokenAmount - Non-negative integer amount in the token's smallest unit
//!
//! Balances, supplies and request amounts are all fixed-point integers.
//! Whole-token quantities are scaled by `10^decimals`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimals used by the token unless configured otherwise
pub const DEFAULT_DECIMALS: u8 = 18;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount overflow")]
    Overflow,

    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount {value} has more than {decimals} decimal places")]
    TooPrecise { value: Decimal, decimals: u8 },

    #[error("Unsupported decimals: {0}")]
    UnsupportedDecimals(u8),

    #[error("Invalid amount: {0}")]
    Invalid(String),
}

/// A non-negative amount of tokens, in the smallest unit.
///
/// # Example
/// ```
/// use trinetra_core::TokenAmount;
///
/// let amount = TokenAmount::from_whole(1000, 18).unwrap();
/// assert_eq!(amount.raw(), 1000 * 10u128.pow(18));
/// assert_eq!(amount.to_units(18).unwrap().to_string(), "1000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAmount(u128);

impl TokenAmount {
    /// Zero amount constant
    pub const ZERO: Self = Self(0);

    /// Wrap a raw smallest-unit value
    #[inline]
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Scale a whole-token quantity by `10^decimals`
    pub fn from_whole(whole: u128, decimals: u8) -> Result<Self, AmountError> {
        let factor = scale_factor(decimals)?;
        whole
            .checked_mul(factor)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    /// Convert a decimal token quantity (e.g. `12.5`) to the smallest unit
    pub fn from_units(value: Decimal, decimals: u8) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::NegativeAmount(value));
        }
        if value.normalize().scale() > u32::from(decimals) {
            return Err(AmountError::TooPrecise { value, decimals });
        }

        let whole = value.trunc();
        let fract = value - whole;

        let factor = scale_factor(decimals)?;
        let whole_raw = whole
            .to_u128()
            .ok_or(AmountError::Overflow)?
            .checked_mul(factor)
            .ok_or(AmountError::Overflow)?;

        // fract < 1, so fract * 10^decimals stays well inside Decimal range
        let factor_dec = Decimal::try_from_i128_with_scale(factor as i128, 0)
            .map_err(|_| AmountError::UnsupportedDecimals(decimals))?;
        let fract_raw = (fract * factor_dec)
            .normalize()
            .to_u128()
            .ok_or_else(|| AmountError::Invalid(value.to_string()))?;

        whole_raw
            .checked_add(fract_raw)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    /// Render as a decimal token quantity (the `formatEther` view)
    pub fn to_units(&self, decimals: u8) -> Result<Decimal, AmountError> {
        let factor = scale_factor(decimals)?;
        let whole = self.0 / factor;
        let fract = self.0 % factor;

        let whole = Decimal::from_str(&whole.to_string()).map_err(|_| AmountError::Overflow)?;
        let fract = Decimal::try_from_i128_with_scale(fract as i128, u32::from(decimals))
            .map_err(|_| AmountError::UnsupportedDecimals(decimals))?;

        whole
            .checked_add(fract)
            .map(|d| d.normalize())
            .ok_or(AmountError::Overflow)
    }

    /// Get the raw smallest-unit value
    #[inline]
    pub const fn raw(&self) -> u128 {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: &TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    /// Checked subtraction - returns None if result would be negative
    pub fn checked_sub(&self, other: &TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(TokenAmount)
    }
}

/// `10^decimals`, bounded so that `to_units` stays representable
fn scale_factor(decimals: u8) -> Result<u128, AmountError> {
    if u32::from(decimals) > 28 {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    10u128
        .checked_pow(u32::from(decimals))
        .ok_or(AmountError::UnsupportedDecimals(decimals))
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(TokenAmount)
            .map_err(|_| AmountError::Invalid(s.to_string()))
    }
}

impl TryFrom<String> for TokenAmount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenAmount> for String {
    fn from(amount: TokenAmount) -> Self {
        amount.0.to_string()
    }
}

impl From<u128> for TokenAmount {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_whole_scales_by_decimals() {
        let amount = TokenAmount::from_whole(1_000_000, 18).unwrap();
        assert_eq!(amount.raw(), 1_000_000 * 10u128.pow(18));
    }

    #[test]
    fn test_from_whole_zero_decimals() {
        let amount = TokenAmount::from_whole(42, 0).unwrap();
        assert_eq!(amount.raw(), 42);
    }

    #[test]
    fn test_from_whole_overflow() {
        let result = TokenAmount::from_whole(u128::MAX, 18);
        assert_eq!(result, Err(AmountError::Overflow));
    }

    #[test]
    fn test_to_units_formats_like_ether() {
        let amount = TokenAmount::new(1_500_000_000_000_000_000);
        assert_eq!(amount.to_units(18).unwrap(), dec!(1.5));
        assert_eq!(amount.to_units(18).unwrap().to_string(), "1.5");
    }

    #[test]
    fn test_from_units_fractional() {
        let amount = TokenAmount::from_units(dec!(12.25), 18).unwrap();
        assert_eq!(amount.raw(), 12_250_000_000_000_000_000);
    }

    #[test]
    fn test_from_units_rejects_negative() {
        let result = TokenAmount::from_units(dec!(-1), 18);
        assert!(matches!(result, Err(AmountError::NegativeAmount(_))));
    }

    #[test]
    fn test_from_units_rejects_excess_precision() {
        let result = TokenAmount::from_units(dec!(0.001), 2);
        assert!(matches!(result, Err(AmountError::TooPrecise { .. })));
    }

    #[test]
    fn test_checked_sub_prevents_negative() {
        let a = TokenAmount::new(50);
        let b = TokenAmount::new(100);
        assert!(a.checked_sub(&b).is_none());
        assert_eq!(b.checked_sub(&a), Some(TokenAmount::new(50)));
    }

    #[test]
    fn test_serializes_as_string() {
        let amount = TokenAmount::new(10u128.pow(24));
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1000000000000000000000000\"");
        let parsed: TokenAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, amount);
    }
}
