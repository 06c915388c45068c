//! Trinetra RPC - CLI orchestrator
//!
//! This crate provides the CLI binary, deployment configuration, the
//! attachment relay and command orchestration.

pub mod attachment;
pub mod commands;
pub mod config;
pub mod context;

pub use attachment::{AttachmentError, AttachmentStore, LocalAttachmentStore};
pub use config::{ConfigError, DeployConfig};
pub use context::{AppContext, CommitError};
