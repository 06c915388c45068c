//! In-process event bus
//!
//! Registered [`EventSubscriber`]s are awaited in registration order, so a
//! publish returns only after every subscriber has seen the events.

use crate::error::BusError;
use crate::event::BusEvent;
use crate::subscriber::EventSubscriber;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trinetra_events::{EngineEvent, EventReader};

/// Event bus for distributing committed events
pub struct EventBus {
    journal_path: PathBuf,
    subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl EventBus {
    /// Create a new event bus over the journal at `journal_path`
    pub fn new(journal_path: impl AsRef<Path>) -> Self {
        Self {
            journal_path: journal_path.as_ref().to_path_buf(),
            subscribers: Vec::new(),
        }
    }

    /// Register a subscriber for awaited delivery
    pub fn register(&mut self, subscriber: Arc<dyn EventSubscriber>) {
        tracing::debug!(subscriber = subscriber.name(), "Subscriber registered");
        self.subscribers.push(subscriber);
    }

    /// Publish the events of one journal record
    ///
    /// Every subscriber sees every event even if an earlier one fails;
    /// the first failure is returned.
    pub async fn publish(&self, sequence: u64, events: &[EngineEvent]) -> Result<(), BusError> {
        let mut first_error = None;

        for event in events {
            let message = BusEvent::new(sequence, event.clone());

            for subscriber in &self.subscribers {
                if let Err(e) = subscriber.handle(&message).await {
                    tracing::warn!(
                        subscriber = subscriber.name(),
                        sequence,
                        event = event.name(),
                        error = %e,
                        "Subscriber failed to handle event"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Replay every journaled event to the registered subscribers
    ///
    /// Subscribers reset themselves in `on_replay_start`.
    pub async fn replay(&self) -> Result<usize, BusError> {
        let records = self.reader()?.read_all()?;

        for subscriber in &self.subscribers {
            subscriber.on_replay_start().await?;
        }

        let mut count = 0;
        for record in &records {
            for event in &record.events {
                let message = BusEvent {
                    sequence: record.sequence,
                    event: event.clone(),
                    timestamp: record.timestamp,
                };
                for subscriber in &self.subscribers {
                    subscriber.handle(&message).await.map_err(|e| {
                        BusError::ReplayFailed(format!("sequence {}: {}", record.sequence, e))
                    })?;
                }
                count += 1;
            }
        }

        for subscriber in &self.subscribers {
            subscriber.on_replay_complete().await?;
        }

        tracing::info!(events = count, "Replay completed");
        Ok(count)
    }

    /// Get an event reader for replay
    pub fn reader(&self) -> Result<EventReader, trinetra_events::EventError> {
        EventReader::from_directory(&self.journal_path)
    }

    /// Get the journal path
    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use trinetra_core::{Address, TokenMetadata};
    use trinetra_events::{EngineCommand, EventStore, JournalRecord};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(u64, String)>>,
        replays: Mutex<usize>,
        completed: Mutex<usize>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl EventSubscriber for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn handle(&self, event: &BusEvent) -> Result<(), BusError> {
            if Some(event.event.name()) == self.fail_on {
                return Err(BusError::SubscriberFailed {
                    name: "recorder".to_string(),
                    reason: "boom".to_string(),
                });
            }
            self.seen
                .lock()
                .unwrap()
                .push((event.sequence, event.event.name().to_string()));
            Ok(())
        }

        async fn on_replay_start(&self) -> Result<(), BusError> {
            self.seen.lock().unwrap().clear();
            *self.replays.lock().unwrap() += 1;
            Ok(())
        }

        async fn on_replay_complete(&self) -> Result<(), BusError> {
            *self.completed.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn events() -> Vec<EngineEvent> {
        vec![
            EngineEvent::TransferApproved {
                id: 1,
                signer: Address::from_label("signer2"),
            },
            EngineEvent::TransferCompleted { id: 1 },
        ]
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers_in_order() {
        let temp = TempDir::new().unwrap();
        let mut bus = EventBus::new(temp.path());
        let recorder = Arc::new(Recorder::default());
        bus.register(recorder.clone());

        bus.publish(5, &events()).await.unwrap();

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(5, "TransferApproved".to_string()), (5, "TransferCompleted".to_string())]
        );
    }

    #[tokio::test]
    async fn test_publish_continues_after_failure() {
        let temp = TempDir::new().unwrap();
        let mut bus = EventBus::new(temp.path());
        let recorder = Arc::new(Recorder {
            fail_on: Some("TransferApproved"),
            ..Default::default()
        });
        bus.register(recorder.clone());

        let result = bus.publish(2, &events()).await;
        assert!(matches!(result, Err(BusError::SubscriberFailed { .. })));
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replay_from_journal() {
        let temp = TempDir::new().unwrap();
        let mut store = EventStore::new(temp.path()).unwrap();
        let admin = Address::from_label("admin");
        store
            .append(&JournalRecord::new(
                1,
                admin,
                EngineCommand::Deploy {
                    administrator: admin,
                    initial_supply: 10,
                    required_signatures: 1,
                    token: TokenMetadata::default(),
                },
                vec![],
                None,
            ))
            .unwrap();
        store
            .append(&JournalRecord::new(
                2,
                Address::from_label("signer1"),
                EngineCommand::ApproveTransfer { id: 1 },
                events(),
                None,
            ))
            .unwrap();
        drop(store);

        let mut bus = EventBus::new(temp.path());
        let recorder = Arc::new(Recorder::default());
        bus.register(recorder.clone());

        assert_eq!(bus.replay().await.unwrap(), 2);
        assert_eq!(bus.replay().await.unwrap(), 2);
        assert_eq!(*recorder.replays.lock().unwrap(), 2);
        assert_eq!(*recorder.completed.lock().unwrap(), 2);
        assert_eq!(recorder.seen.lock().unwrap().len(), 2);
    }
}
