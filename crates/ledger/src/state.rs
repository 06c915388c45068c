//! In-memory token ledger
//!
//! Tracks balances per address and the total supply. Every mutation keeps
//! `sum(balances) == total_supply`.

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trinetra_core::{Address, TokenAmount};

/// Balance ledger with total supply
#[derive(Debug, Default, Clone)]
pub struct TokenLedger {
    balances: HashMap<Address, TokenAmount>,
    total_supply: TokenAmount,
}

/// Recomputed supply figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyAudit {
    /// Sum of all balances
    pub balances: TokenAmount,
    /// Recorded total supply
    pub supply: TokenAmount,
    /// Number of accounts holding a non-zero balance
    pub holders: usize,
}

impl SupplyAudit {
    /// True when the balances add up to the supply
    pub fn is_consistent(&self) -> bool {
        self.balances == self.supply
    }
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger whose whole supply belongs to `holder`
    pub fn with_genesis(holder: Address, supply: TokenAmount) -> Self {
        let mut ledger = Self::new();
        if !supply.is_zero() {
            ledger.balances.insert(holder, supply);
        }
        ledger.total_supply = supply;
        ledger
    }

    /// Get balance for an account (returns 0 if not found)
    pub fn balance_of(&self, account: &Address) -> TokenAmount {
        self.balances
            .get(account)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Total tokens in existence
    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    /// Fail with `InsufficientBalance` unless `account` holds at least `amount`
    pub fn ensure_balance(&self, account: &Address, amount: TokenAmount) -> Result<(), LedgerError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *account,
                available,
                required: amount,
            });
        }
        Ok(())
    }

    /// Move `amount` from one account to another
    ///
    /// All checks run before any balance is touched. `from == to` is a no-op
    /// once the balance check passes.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        self.ensure_balance(from, amount)?;
        if from == to {
            return Ok(());
        }

        let debited = self
            .balance_of(from)
            .checked_sub(&amount)
            .ok_or(LedgerError::Overflow(*from))?;
        let credited = self
            .balance_of(to)
            .checked_add(&amount)
            .ok_or(LedgerError::Overflow(*to))?;

        self.set_balance(*from, debited);
        self.set_balance(*to, credited);

        tracing::debug!(from = %from.short(), to = %to.short(), %amount, "Ledger transfer applied");
        Ok(())
    }

    /// Destroy `amount` from `from`, reducing the total supply
    pub fn burn(&mut self, from: &Address, amount: TokenAmount) -> Result<(), LedgerError> {
        self.ensure_balance(from, amount)?;

        let supply = self
            .total_supply
            .checked_sub(&amount)
            .ok_or(LedgerError::SupplyUnderflow {
                amount,
                supply: self.total_supply,
            })?;
        let debited = self
            .balance_of(from)
            .checked_sub(&amount)
            .ok_or(LedgerError::Overflow(*from))?;

        self.set_balance(*from, debited);
        self.total_supply = supply;

        tracing::debug!(from = %from.short(), %amount, supply = %self.total_supply, "Ledger burn applied");
        Ok(())
    }

    /// Recompute the sum of balances and compare it with the supply
    pub fn audit(&self) -> SupplyAudit {
        let mut sum = TokenAmount::ZERO;
        for balance in self.balances.values() {
            // u128 cannot overflow here: every balance came out of the supply
            sum = sum.checked_add(balance).unwrap_or(TokenAmount::new(u128::MAX));
        }

        SupplyAudit {
            balances: sum,
            supply: self.total_supply,
            holders: self.balances.len(),
        }
    }

    /// Like `audit`, but fails on a mismatch
    pub fn verify_conservation(&self) -> Result<SupplyAudit, LedgerError> {
        let audit = self.audit();
        if !audit.is_consistent() {
            return Err(LedgerError::SupplyMismatch {
                balances: audit.balances,
                supply: audit.supply,
            });
        }
        Ok(audit)
    }

    /// All non-zero balances (for debugging/testing)
    pub fn all_balances(&self) -> &HashMap<Address, TokenAmount> {
        &self.balances
    }

    fn set_balance(&mut self, account: Address, balance: TokenAmount) {
        if balance.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }
}
