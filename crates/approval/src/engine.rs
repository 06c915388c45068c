//! Authorization engine

use crate::config::EngineConfig;
use crate::error::{EngineError, RequestKind};
use crate::request::{ApprovalOutcome, Approvals, BurnRequest, RequestStatus, TransferRequest};
use crate::signer::SignerRegistry;
use std::collections::BTreeMap;
use trinetra_core::{Address, TokenAmount, TokenMetadata};
use trinetra_events::{EngineCommand, EngineEvent};
use trinetra_ledger::{LedgerError, SupplyAudit, TokenLedger};

/// Return value of a mutating operation plus the events it emitted, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted<T> {
    pub value: T,
    pub events: Vec<EngineEvent>,
}

impl<T> Emitted<T> {
    fn new(value: T, events: Vec<EngineEvent>) -> Self {
        Self { value, events }
    }
}

/// Multi-signature authorization engine
///
/// Owns the token ledger, the signer set and every request record. Each
/// operation takes `&mut self` and runs to completion, so operations are
/// serialized by construction.
pub struct AuthorizationEngine {
    config: EngineConfig,
    ledger: TokenLedger,
    signers: SignerRegistry,
    transfers: BTreeMap<u64, TransferRequest>,
    burns: BTreeMap<u64, BurnRequest>,
    next_transfer_id: u64,
    next_burn_id: u64,
    /// Append-only log of everything emitted
    events: Vec<EngineEvent>,
}

impl AuthorizationEngine {
    /// Deploy a new engine, minting the initial supply to the administrator
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        if config.required_signatures == 0 {
            return Err(EngineError::InvalidQuorum);
        }

        let supply = TokenAmount::from_whole(u128::from(config.initial_supply), config.token.decimals)?;
        let ledger = TokenLedger::with_genesis(config.administrator, supply);

        tracing::info!(
            administrator = %config.administrator,
            supply = %supply,
            required_signatures = config.required_signatures,
            "Engine deployed"
        );

        Ok(Self {
            signers: SignerRegistry::new(config.administrator),
            config,
            ledger,
            transfers: BTreeMap::new(),
            burns: BTreeMap::new(),
            next_transfer_id: 1,
            next_burn_id: 1,
            events: Vec::new(),
        })
    }

    // === Queries ===

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn administrator(&self) -> Address {
        self.signers.administrator()
    }

    pub fn required_signatures(&self) -> u32 {
        self.config.required_signatures
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.config.token
    }

    pub fn balance_of(&self, account: &Address) -> TokenAmount {
        self.ledger.balance_of(account)
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.ledger.total_supply()
    }

    /// Recompute supply from balances
    pub fn audit(&self) -> SupplyAudit {
        self.ledger.audit()
    }

    pub fn is_signer(&self, account: &Address) -> bool {
        self.signers.is_signer(account)
    }

    pub fn signers(&self) -> Vec<Address> {
        self.signers.signers()
    }

    pub fn transfer_request(&self, id: u64) -> Option<&TransferRequest> {
        self.transfers.get(&id)
    }

    pub fn burn_request(&self, id: u64) -> Option<&BurnRequest> {
        self.burns.get(&id)
    }

    /// All transfer requests in id order
    pub fn transfer_requests(&self) -> impl Iterator<Item = &TransferRequest> {
        self.transfers.values()
    }

    /// All burn requests in id order
    pub fn burn_requests(&self) -> impl Iterator<Item = &BurnRequest> {
        self.burns.values()
    }

    pub fn transfer_count(&self) -> u64 {
        self.next_transfer_id - 1
    }

    pub fn burn_count(&self) -> u64 {
        self.next_burn_id - 1
    }

    /// Every event emitted since deployment
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    // === Signer management ===

    /// Add a signer (administrator only). Returns false if already present.
    pub fn add_signer(&mut self, caller: &Address, candidate: Address) -> Result<Emitted<bool>, EngineError> {
        let added = self.signers.add(caller, candidate)?;
        Ok(Emitted::new(added, Vec::new()))
    }

    /// Remove a signer (administrator only). Returns false if not present.
    pub fn remove_signer(&mut self, caller: &Address, target: &Address) -> Result<Emitted<bool>, EngineError> {
        let removed = self.signers.remove(caller, target)?;
        Ok(Emitted::new(removed, Vec::new()))
    }

    // === Transfer workflow ===

    /// Open a transfer request from `caller` to `to`
    ///
    /// The balance check here is advisory: nothing is reserved.
    pub fn initiate_transfer(
        &mut self,
        caller: &Address,
        to: Address,
        amount: TokenAmount,
        attachment_ref: impl Into<String>,
    ) -> Result<Emitted<u64>, EngineError> {
        self.check_initiation(caller, amount)?;

        let id = self.next_transfer_id;
        self.next_transfer_id += 1;

        let request = TransferRequest::new(id, *caller, to, amount, attachment_ref.into());
        let event = EngineEvent::TransferRequestCreated {
            id,
            from: request.from,
            to: request.to,
            amount,
            attachment_ref: request.attachment_ref.clone(),
        };
        self.transfers.insert(id, request);

        tracing::info!(id, from = %caller.short(), to = %to.short(), %amount, "Transfer request created");
        Ok(self.emit(id, vec![event]))
    }

    /// Approve a transfer request; the quorum-reaching approval settles it
    pub fn approve_transfer(&mut self, caller: &Address, id: u64) -> Result<Emitted<ApprovalOutcome>, EngineError> {
        self.signers.ensure_signer(caller)?;

        let required = self.config.required_signatures;
        let request = self
            .transfers
            .get_mut(&id)
            .ok_or(EngineError::NotFound {
                kind: RequestKind::Transfer,
                id,
            })?;
        ensure_approvable(RequestKind::Transfer, id, request.status, &request.approvals, caller, required)?;

        if request.approvals.next_count() < required as usize {
            request.approvals.record(*caller);
            let approvals = request.approvals.count();
            tracing::debug!(id, signer = %caller.short(), approvals, required, "Transfer approval recorded");

            let event = EngineEvent::TransferApproved { id, signer: *caller };
            return Ok(self.emit(ApprovalOutcome::Recorded { approvals, required }, vec![event]));
        }

        // Quorum-reaching approval: re-validate against the current balance
        let available = self.ledger.balance_of(&request.from);
        if available < request.amount {
            request.approvals.record(*caller);
            tracing::warn!(
                id,
                from = %request.from.short(),
                %available,
                required = %request.amount,
                "Transfer re-validation failed; request stalled"
            );
            return Err(EngineError::BalanceChanged {
                kind: RequestKind::Transfer,
                id,
                available,
                required: request.amount,
            });
        }

        self.ledger
            .transfer(&request.from, &request.to, request.amount)
            .map_err(|e| revalidation_error(e, RequestKind::Transfer, id))?;
        request.approvals.record(*caller);
        request.status = RequestStatus::Completed;

        tracing::info!(id, from = %request.from.short(), to = %request.to.short(), amount = %request.amount, "Transfer completed");

        let events = vec![
            EngineEvent::TransferApproved { id, signer: *caller },
            EngineEvent::TransferCompleted { id },
        ];
        Ok(self.emit(ApprovalOutcome::Completed, events))
    }

    // === Burn workflow ===

    /// Open a burn request for `caller`'s tokens
    pub fn initiate_burn(
        &mut self,
        caller: &Address,
        amount: TokenAmount,
        bank_details: impl Into<String>,
    ) -> Result<Emitted<u64>, EngineError> {
        self.check_initiation(caller, amount)?;

        let id = self.next_burn_id;
        self.next_burn_id += 1;

        let request = BurnRequest::new(id, *caller, amount, bank_details.into());
        let event = EngineEvent::BurnRequestCreated {
            id,
            from: request.from,
            amount,
            bank_details: request.bank_details.clone(),
        };
        self.burns.insert(id, request);

        tracing::info!(id, from = %caller.short(), %amount, "Burn request created");
        Ok(self.emit(id, vec![event]))
    }

    /// Approve a burn request; the quorum-reaching approval destroys the tokens
    ///
    /// Intermediate approvals emit nothing; `BurnRequestApproved` fires once,
    /// on completion.
    pub fn approve_burn(&mut self, caller: &Address, id: u64) -> Result<Emitted<ApprovalOutcome>, EngineError> {
        self.signers.ensure_signer(caller)?;

        let required = self.config.required_signatures;
        let request = self.burns.get_mut(&id).ok_or(EngineError::NotFound {
            kind: RequestKind::Burn,
            id,
        })?;
        ensure_approvable(RequestKind::Burn, id, request.status, &request.approvals, caller, required)?;

        if request.approvals.next_count() < required as usize {
            request.approvals.record(*caller);
            let approvals = request.approvals.count();
            tracing::debug!(id, signer = %caller.short(), approvals, required, "Burn approval recorded");

            return Ok(self.emit(ApprovalOutcome::Recorded { approvals, required }, Vec::new()));
        }

        let available = self.ledger.balance_of(&request.from);
        if available < request.amount {
            request.approvals.record(*caller);
            tracing::warn!(
                id,
                from = %request.from.short(),
                %available,
                required = %request.amount,
                "Burn re-validation failed; request stalled"
            );
            return Err(EngineError::BalanceChanged {
                kind: RequestKind::Burn,
                id,
                available,
                required: request.amount,
            });
        }

        self.ledger
            .burn(&request.from, request.amount)
            .map_err(|e| revalidation_error(e, RequestKind::Burn, id))?;
        request.approvals.record(*caller);
        request.status = RequestStatus::Completed;

        tracing::info!(id, from = %request.from.short(), amount = %request.amount, supply = %self.ledger.total_supply(), "Burn completed");

        let event = EngineEvent::BurnRequestApproved {
            id,
            from: request.from,
            amount: request.amount,
            bank_details: request.bank_details.clone(),
        };
        Ok(self.emit(ApprovalOutcome::Completed, vec![event]))
    }

    // === Journal dispatch ===

    /// Run a journaled command on behalf of `caller`
    ///
    /// `Deploy` is rejected here; it is handled by [`AuthorizationEngine::replay`].
    pub fn execute(&mut self, caller: &Address, command: &EngineCommand) -> Result<Vec<EngineEvent>, EngineError> {
        let events = match command {
            EngineCommand::Deploy { .. } => return Err(EngineError::AlreadyDeployed),
            EngineCommand::AddSigner { candidate } => self.add_signer(caller, *candidate)?.events,
            EngineCommand::RemoveSigner { target } => self.remove_signer(caller, target)?.events,
            EngineCommand::InitiateTransfer {
                to,
                amount,
                attachment_ref,
            } => self.initiate_transfer(caller, *to, *amount, attachment_ref.clone())?.events,
            EngineCommand::ApproveTransfer { id } => self.approve_transfer(caller, *id)?.events,
            EngineCommand::InitiateBurn { amount, bank_details } => {
                self.initiate_burn(caller, *amount, bank_details.clone())?.events
            }
            EngineCommand::ApproveBurn { id } => self.approve_burn(caller, *id)?.events,
        };
        Ok(events)
    }

    // === Internals ===

    fn check_initiation(&self, caller: &Address, amount: TokenAmount) -> Result<(), EngineError> {
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount);
        }
        let available = self.ledger.balance_of(caller);
        if available < amount {
            return Err(EngineError::InsufficientBalance {
                account: *caller,
                available,
                required: amount,
            });
        }
        Ok(())
    }

    fn emit<T>(&mut self, value: T, events: Vec<EngineEvent>) -> Emitted<T> {
        self.events.extend(events.iter().cloned());
        Emitted::new(value, events)
    }
}

/// Shared preconditions of `approve_transfer` / `approve_burn`, after the
/// signer check and lookup
fn ensure_approvable(
    kind: RequestKind,
    id: u64,
    status: RequestStatus,
    approvals: &Approvals,
    caller: &Address,
    required: u32,
) -> Result<(), EngineError> {
    if status != RequestStatus::Pending {
        return Err(EngineError::InvalidState {
            kind,
            id,
            reason: "request already completed",
        });
    }
    if approvals.contains(caller) {
        return Err(EngineError::DuplicateApproval {
            kind,
            id,
            signer: *caller,
        });
    }
    if approvals.has_quorum(required) {
        return Err(EngineError::InvalidState {
            kind,
            id,
            reason: "request stalled after failed re-validation",
        });
    }
    Ok(())
}

/// The ledger re-checks the balance itself; map that case onto the
/// workflow error so callers see one failure shape
fn revalidation_error(err: LedgerError, kind: RequestKind, id: u64) -> EngineError {
    match err {
        LedgerError::InsufficientBalance {
            available, required, ..
        } => EngineError::BalanceChanged {
            kind,
            id,
            available,
            required,
        },
        other => EngineError::Ledger(other),
    }
}
