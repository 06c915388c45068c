//! Signer set under administrator control

use crate::error::EngineError;
use std::collections::BTreeSet;
use trinetra_core::Address;

/// The administrator plus the set of accounts allowed to approve
#[derive(Debug, Clone)]
pub struct SignerRegistry {
    administrator: Address,
    signers: BTreeSet<Address>,
}

impl SignerRegistry {
    pub fn new(administrator: Address) -> Self {
        Self {
            administrator,
            signers: BTreeSet::new(),
        }
    }

    pub fn administrator(&self) -> Address {
        self.administrator
    }

    pub fn is_administrator(&self, account: &Address) -> bool {
        self.administrator == *account
    }

    /// Add a signer. Returns false if the candidate was already a signer.
    pub fn add(&mut self, caller: &Address, candidate: Address) -> Result<bool, EngineError> {
        if !self.is_administrator(caller) {
            return Err(EngineError::Unauthorized {
                reason: EngineError::ONLY_ADMIN_ADD,
            });
        }
        if self.is_administrator(&candidate) {
            return Err(EngineError::AdministratorRole);
        }

        let added = self.signers.insert(candidate);
        if added {
            tracing::info!(signer = %candidate, "Signer added");
        }
        Ok(added)
    }

    /// Remove a signer. Returns false if the target was not a signer.
    pub fn remove(&mut self, caller: &Address, target: &Address) -> Result<bool, EngineError> {
        if !self.is_administrator(caller) {
            return Err(EngineError::Unauthorized {
                reason: EngineError::ONLY_ADMIN_REMOVE,
            });
        }
        if self.is_administrator(target) {
            return Err(EngineError::AdministratorRole);
        }

        let removed = self.signers.remove(target);
        if removed {
            tracing::info!(signer = %target, "Signer removed");
        }
        Ok(removed)
    }

    pub fn is_signer(&self, account: &Address) -> bool {
        self.signers.contains(account)
    }

    /// Fail with `Unauthorized` unless `account` is a signer
    pub fn ensure_signer(&self, account: &Address) -> Result<(), EngineError> {
        if !self.is_signer(account) {
            return Err(EngineError::Unauthorized {
                reason: EngineError::ONLY_SIGNERS,
            });
        }
        Ok(())
    }

    /// Current signers in address order
    pub fn signers(&self) -> Vec<Address> {
        self.signers.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}
