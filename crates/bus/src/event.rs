//! Bus messages for pub/sub distribution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trinetra_events::EngineEvent;

/// An engine event that was committed to the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    /// Journal sequence of the command that emitted it
    pub sequence: u64,
    pub event: EngineEvent,
    /// When the event was published (or replayed)
    pub timestamp: DateTime<Utc>,
}

impl BusEvent {
    pub fn new(sequence: u64, event: EngineEvent) -> Self {
        Self {
            sequence,
            event,
            timestamp: Utc::now(),
        }
    }
}
