//! Application context - wires everything together

use crate::attachment::LocalAttachmentStore;
use crate::config::{ConfigError, DeployConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trinetra_approval::{AuthorizationEngine, EngineError};
use trinetra_bus::EventBus;
use trinetra_core::Address;
use trinetra_events::{EngineCommand, EventReader, EventStore, JournalRecord};
use trinetra_indexer::Indexer;

/// Application context - wires together all components
pub struct AppContext {
    engine: Option<AuthorizationEngine>,
    pub event_store: EventStore,
    pub bus: EventBus,
    pub indexer: Option<Arc<Indexer>>,
    pub attachments: LocalAttachmentStore,
    journal_path: PathBuf,
    mirror_path: PathBuf,
    last_sequence: u64,
}

impl AppContext {
    /// Open the data directory, rebuilding the engine and mirror from the journal
    pub async fn new(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref();
        let journal_path = data_path.join("journal");
        let mirror_path = data_path.join("mirror.db");

        std::fs::create_dir_all(&journal_path)?;

        let event_store = EventStore::new(&journal_path)?;
        let mut bus = EventBus::new(&journal_path);
        let attachments = LocalAttachmentStore::new(data_path.join("attachments"))?;

        // Replay the journal to rebuild engine state
        let reader = EventReader::from_directory(&journal_path)?;
        let records = reader.read_all()?;
        let last_sequence = records.last().map(|r| r.sequence).unwrap_or(0);

        let engine = if records.is_empty() {
            None
        } else {
            Some(AuthorizationEngine::replay(&records)?)
        };

        let indexer = match &engine {
            Some(engine) => Self::open_indexer(&mirror_path, engine.metadata().decimals, &mut bus).await,
            None => None,
        };
        if indexer.is_some() {
            if let Err(e) = bus.replay().await {
                tracing::warn!(error = %e, "Mirror rebuild failed");
            }
        }

        Ok(Self {
            engine,
            event_store,
            bus,
            indexer,
            attachments,
            journal_path,
            mirror_path,
            last_sequence,
        })
    }

    /// The mirror is disposable: failing to open it only disables the read views
    async fn open_indexer(mirror_path: &Path, decimals: u8, bus: &mut EventBus) -> Option<Arc<Indexer>> {
        match Indexer::new(mirror_path, decimals).await {
            Ok(indexer) => {
                let indexer = Arc::new(indexer);
                bus.register(indexer.clone());
                Some(indexer)
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %mirror_path.display(), "Mirror unavailable");
                None
            }
        }
    }

    /// Deploy the engine: journal the `Deploy` record, then add configured signers
    pub async fn deploy(&mut self, config: &DeployConfig) -> Result<JournalRecord, CommitError> {
        if self.engine.is_some() {
            return Err(CommitError::Engine(EngineError::AlreadyDeployed));
        }
        config.validate()?;

        let engine_config = config.engine_config();
        let engine = AuthorizationEngine::new(engine_config.clone())?;

        let record = JournalRecord::new(
            self.last_sequence + 1,
            engine_config.administrator,
            engine_config.to_command(),
            Vec::new(),
            None,
        );
        self.event_store.append(&record)?;
        self.last_sequence = record.sequence;

        self.indexer = Self::open_indexer(&self.mirror_path, engine_config.token.decimals, &mut self.bus).await;
        if let Some(ref indexer) = self.indexer {
            if let Err(e) = indexer.clear().await {
                tracing::warn!(error = %e, "Could not reset mirror");
            }
        }
        self.engine = Some(engine);

        for signer in &config.signers {
            self.run(config.administrator, EngineCommand::AddSigner { candidate: *signer })
                .await?;
        }

        Ok(record)
    }

    /// Run a command on behalf of `caller`
    ///
    /// Flow: Execute → Append → Publish
    ///
    /// Successful commands are journaled with their events. A failure that
    /// still changed engine state (a stalled final approval) is journaled
    /// with its error text and then returned. Every other failure leaves no
    /// trace.
    pub async fn run(&mut self, caller: Address, command: EngineCommand) -> Result<JournalRecord, CommitError> {
        let engine = self.engine.as_mut().ok_or(CommitError::NotDeployed)?;
        let sequence = self.last_sequence + 1;

        let (record, failure) = match engine.execute(&caller, &command) {
            Ok(events) => (JournalRecord::new(sequence, caller, command, events, None), None),
            Err(err) if err.is_state_changing() => {
                let record = JournalRecord::new(sequence, caller, command, Vec::new(), Some(err.to_string()));
                (record, Some(err))
            }
            Err(err) => return Err(err.into()),
        };

        // The engine already moved; a failed append leaves the journal behind
        // until the next restart replays it.
        self.event_store.append(&record)?;
        self.last_sequence = sequence;

        if let Err(e) = self.bus.publish(sequence, &record.events).await {
            tracing::warn!(sequence, error = %e, "Event publication incomplete");
        }

        match failure {
            Some(err) => Err(CommitError::Engine(err)),
            None => Ok(record),
        }
    }

    /// The deployed engine
    pub fn engine(&self) -> Result<&AuthorizationEngine, CommitError> {
        self.engine.as_ref().ok_or(CommitError::NotDeployed)
    }

    /// The request mirror, if it could be opened
    pub fn indexer(&self) -> Option<&Indexer> {
        self.indexer.as_deref()
    }

    /// Get journal path
    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Get mirror database path
    pub fn mirror_path(&self) -> &Path {
        &self.mirror_path
    }

    /// Check if the engine has been deployed
    pub fn is_deployed(&self) -> bool {
        self.engine.is_some()
    }

    /// Get last sequence number
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }
}

/// Errors while running a command
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("Engine not deployed; run `trinetra deploy` first")]
    NotDeployed,

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("Invalid deployment config: {0}")]
    Config(#[from] ConfigError),

    #[error("Event store error: {0}")]
    Event(#[from] trinetra_events::EventError),
}

impl CommitError {
    /// The engine error, when the command was rejected by the engine
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            CommitError::Engine(err) => Some(err),
            _ => None,
        }
    }
}
