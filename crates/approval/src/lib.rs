//! # Trinetra Approval
//!
//! Multi-signature authorization engine for token transfers and burns.
//!
//! ## Workflows
//! - Transfer: `initiate_transfer` → N × `approve_transfer` → balances move
//! - Burn: `initiate_burn` → N × `approve_burn` → supply shrinks
//!
//! ## Rules
//! - Only the administrator manages the signer set
//! - Only signers approve, each at most once per request
//! - The balance check at initiation is advisory; the decisive check runs
//!   when the quorum-reaching approval arrives
//! - A request whose final approval fails that check stays Pending forever
//!   (stalled); nothing else can complete it

mod config;
mod engine;
mod error;
mod replay;
mod request;
mod signer;

pub use config::EngineConfig;
pub use engine::{AuthorizationEngine, Emitted};
pub use error::{EngineError, RequestKind};
pub use request::{ApprovalOutcome, Approvals, BurnRequest, RequestStatus, TransferRequest};
pub use signer::SignerRegistry;
