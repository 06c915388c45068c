//! Event subscriber trait for async event handling

use crate::error::BusError;
use crate::event::BusEvent;
use async_trait::async_trait;

/// Trait for event subscribers
///
/// Subscribers receive events from the event bus and process them asynchronously.
/// Delivery is at-least-once: handlers must be idempotent and must tolerate
/// events arriving for requests they have not seen created yet.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Get the subscriber name (for logging)
    fn name(&self) -> &str;

    /// Handle a bus message
    async fn handle(&self, event: &BusEvent) -> Result<(), BusError>;

    /// Called when replay starts (optional)
    ///
    /// Subscribers can use this to drop state before bulk processing.
    async fn on_replay_start(&self) -> Result<(), BusError> {
        Ok(())
    }

    /// Called when replay completes (optional)
    async fn on_replay_complete(&self) -> Result<(), BusError> {
        Ok(())
    }
}
