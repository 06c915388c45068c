//! Trinetra Event Bus - In-process async event distribution
//!
//! Distributes committed engine events to subscribers (the indexer, etc.)
//!
//! # Features
//! - EventSubscriber trait for awaited, in-order delivery
//! - Replay from JSONL (Source of Truth)
//! - No retention in bus - events only in JSONL

pub mod channel;
pub mod error;
pub mod event;
pub mod subscriber;

pub use channel::EventBus;
pub use error::BusError;
pub use event::BusEvent;
pub use subscriber::EventSubscriber;
