//! Trinetra Events - Engine events and JSONL operation journal
//!
//! The journal is the Source of Truth: engine state is rebuilt by
//! re-executing its commands, and the SQLite mirror is disposable.

pub mod command;
pub mod error;
pub mod event;
pub mod reader;
pub mod store;

pub use command::{EngineCommand, JournalRecord};
pub use error::EventError;
pub use event::EngineEvent;
pub use reader::EventReader;
pub use store::EventStore;
