//! Indexer - coordinates the request mirrors, replay and live updates

use crate::burn::{BurnFields, BurnMirror, BurnRow};
use crate::error::IndexerError;
use crate::transfer::{NewTransfer, TransferMirror, TransferRow};
use crate::{STATUS_COMPLETED, STATUS_PENDING};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use trinetra_bus::{BusError, BusEvent, EventSubscriber};
use trinetra_core::TokenAmount;
use trinetra_events::EngineEvent;

/// Off-chain mirror of transfer and burn requests
pub struct Indexer {
    transfers: TransferMirror,
    burns: BurnMirror,
    decimals: u8,
}

impl Indexer {
    /// Open (or create) the mirror database at `db_path`
    pub async fn new(db_path: impl AsRef<Path>, decimals: u8) -> Result<Self, IndexerError> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePool::connect(&db_url).await?;
        Self::with_pool(pool, decimals).await
    }

    /// Mirror held in memory, gone when dropped
    pub async fn in_memory(decimals: u8) -> Result<Self, IndexerError> {
        // every connection to sqlite::memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool, decimals).await
    }

    async fn with_pool(pool: SqlitePool, decimals: u8) -> Result<Self, IndexerError> {
        let transfers = TransferMirror::new(pool.clone());
        transfers.init().await?;
        let burns = BurnMirror::new(pool);
        burns.init().await?;

        Ok(Self {
            transfers,
            burns,
            decimals,
        })
    }

    /// Apply one engine event committed at journal `sequence`
    pub async fn apply(
        &self,
        sequence: u64,
        at: DateTime<Utc>,
        event: &EngineEvent,
    ) -> Result<(), IndexerError> {
        match event {
            EngineEvent::TransferRequestCreated {
                id,
                from,
                to,
                amount,
                attachment_ref,
            } => {
                let transfer = NewTransfer {
                    id: *id,
                    from: from.to_string(),
                    to: to.to_string(),
                    amount: amount.to_string(),
                    amount_units: self.format_units(amount)?,
                    attachment_ref,
                };
                self.transfers.created(transfer, sequence, at).await?;
            }
            EngineEvent::TransferApproved { id, signer } => {
                self.transfers.approved(*id, &signer.to_string(), at).await?;
            }
            EngineEvent::TransferCompleted { id } => {
                self.transfers.completed(*id, at).await?;
            }
            EngineEvent::BurnRequestCreated {
                id,
                from,
                amount,
                bank_details,
            } => {
                let burn = self.burn_fields(*id, from, amount, bank_details)?;
                self.burns.created(burn, sequence, at).await?;
            }
            EngineEvent::BurnRequestApproved {
                id,
                from,
                amount,
                bank_details,
            } => {
                let burn = self.burn_fields(*id, from, amount, bank_details)?;
                self.burns.completed(burn, sequence, at).await?;
            }
        }
        Ok(())
    }

    fn burn_fields<'a>(
        &self,
        id: u64,
        from: &trinetra_core::Address,
        amount: &TokenAmount,
        bank_details: &'a str,
    ) -> Result<BurnFields<'a>, IndexerError> {
        Ok(BurnFields {
            id,
            from: from.to_string(),
            amount: amount.to_string(),
            amount_units: self.format_units(amount)?,
            bank_details,
        })
    }

    fn format_units(&self, amount: &TokenAmount) -> Result<String, IndexerError> {
        Ok(amount.to_units(self.decimals)?.to_string())
    }

    /// Drop every mirrored row
    pub async fn clear(&self) -> Result<(), IndexerError> {
        self.transfers.clear().await?;
        self.burns.clear().await?;
        Ok(())
    }

    pub async fn pending_transfers(&self) -> Result<Vec<TransferRow>, IndexerError> {
        self.transfers.by_status(STATUS_PENDING).await
    }

    pub async fn completed_transfers(&self) -> Result<Vec<TransferRow>, IndexerError> {
        self.transfers.by_status(STATUS_COMPLETED).await
    }

    pub async fn pending_burns(&self) -> Result<Vec<BurnRow>, IndexerError> {
        self.burns.by_status(STATUS_PENDING).await
    }

    pub async fn completed_burns(&self) -> Result<Vec<BurnRow>, IndexerError> {
        self.burns.by_status(STATUS_COMPLETED).await
    }

    pub async fn transfer(&self, id: u64) -> Result<Option<TransferRow>, IndexerError> {
        self.transfers.get(id).await
    }

    pub async fn burn(&self, id: u64) -> Result<Option<BurnRow>, IndexerError> {
        self.burns.get(id).await
    }
}

#[async_trait]
impl EventSubscriber for Indexer {
    fn name(&self) -> &str {
        "indexer"
    }

    async fn handle(&self, event: &BusEvent) -> Result<(), BusError> {
        self.apply(event.sequence, event.timestamp, &event.event)
            .await
            .map_err(|e| BusError::SubscriberFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })
    }

    async fn on_replay_start(&self) -> Result<(), BusError> {
        self.clear().await.map_err(|e| BusError::SubscriberFailed {
            name: self.name().to_string(),
            reason: e.to_string(),
        })
    }

    async fn on_replay_complete(&self) -> Result<(), BusError> {
        tracing::info!("Mirror rebuilt");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trinetra_core::Address;

    const DECIMALS: u8 = 18;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn tokens(n: u128) -> TokenAmount {
        TokenAmount::from_whole(n, DECIMALS).unwrap()
    }

    fn created(id: u64, amount: u128) -> EngineEvent {
        EngineEvent::TransferRequestCreated {
            id,
            from: addr("admin"),
            to: addr("user1"),
            amount: tokens(amount),
            attachment_ref: format!("bill-{}", id),
        }
    }

    fn approved(id: u64, signer: &str) -> EngineEvent {
        EngineEvent::TransferApproved {
            id,
            signer: addr(signer),
        }
    }

    #[tokio::test]
    async fn test_transfer_lifecycle() {
        let indexer = Indexer::in_memory(DECIMALS).await.unwrap();
        let now = Utc::now();

        indexer.apply(3, now, &created(1, 1000)).await.unwrap();
        indexer.apply(4, now, &approved(1, "signer1")).await.unwrap();

        let pending = indexer.pending_transfers().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].amount_units, "1000");
        assert_eq!(pending[0].amount, tokens(1000).to_string());
        assert_eq!(pending[0].approval_count, 1);
        assert_eq!(pending[0].attachment_ref, "bill-1");

        indexer.apply(5, now, &approved(1, "signer2")).await.unwrap();
        indexer
            .apply(5, now, &EngineEvent::TransferCompleted { id: 1 })
            .await
            .unwrap();

        assert!(indexer.pending_transfers().await.unwrap().is_empty());
        let done = indexer.transfer(1).await.unwrap().unwrap();
        assert!(done.is_completed());
        assert_eq!(
            done.approvers,
            vec![addr("signer1").to_string(), addr("signer2").to_string()]
        );
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_idempotent() {
        let indexer = Indexer::in_memory(DECIMALS).await.unwrap();
        let now = Utc::now();

        for _ in 0..2 {
            indexer.apply(1, now, &created(1, 5)).await.unwrap();
            indexer.apply(2, now, &approved(1, "signer1")).await.unwrap();
        }

        let row = indexer.transfer(1).await.unwrap().unwrap();
        assert_eq!(row.approval_count, 1);
        assert_eq!(row.approvers.len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_order_delivery_converges() {
        let indexer = Indexer::in_memory(DECIMALS).await.unwrap();
        let now = Utc::now();

        indexer.apply(2, now, &approved(1, "signer1")).await.unwrap();
        indexer
            .apply(2, now, &EngineEvent::TransferCompleted { id: 1 })
            .await
            .unwrap();

        let placeholder = indexer.transfer(1).await.unwrap().unwrap();
        assert!(placeholder.is_placeholder());

        indexer.apply(1, now, &created(1, 7)).await.unwrap();

        let row = indexer.transfer(1).await.unwrap().unwrap();
        assert!(!row.is_placeholder());
        assert!(row.is_completed());
        assert_eq!(row.approval_count, 1);
        assert_eq!(row.to, addr("user1").to_string());
        assert_eq!(row.created_seq, 1);
    }

    #[tokio::test]
    async fn test_recency_ordering() {
        let indexer = Indexer::in_memory(DECIMALS).await.unwrap();
        let now = Utc::now();

        indexer.apply(2, now, &created(1, 1)).await.unwrap();
        indexer.apply(3, now, &created(2, 1)).await.unwrap();
        indexer.apply(4, now, &created(3, 1)).await.unwrap();

        let ids: Vec<u64> = indexer
            .pending_transfers()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_burn_lifecycle_and_early_completion() {
        let indexer = Indexer::in_memory(DECIMALS).await.unwrap();
        let now = Utc::now();
        let burn = |id| EngineEvent::BurnRequestCreated {
            id,
            from: addr("user1"),
            amount: tokens(100),
            bank_details: "ACC-1".to_string(),
        };
        let done = |id| EngineEvent::BurnRequestApproved {
            id,
            from: addr("user1"),
            amount: tokens(100),
            bank_details: "ACC-1".to_string(),
        };

        indexer.apply(1, now, &burn(1)).await.unwrap();
        assert_eq!(indexer.pending_burns().await.unwrap().len(), 1);
        indexer.apply(2, now, &done(1)).await.unwrap();
        assert!(indexer.pending_burns().await.unwrap().is_empty());

        // completion first, creation replayed afterwards
        indexer.apply(4, now, &done(2)).await.unwrap();
        indexer.apply(3, now, &burn(2)).await.unwrap();

        let completed = indexer.completed_burns().await.unwrap();
        assert_eq!(completed.len(), 2);
        assert!(completed.iter().all(|b| b.amount_units == "100"));
        assert!(indexer.burn(9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replay_start_clears_existing_rows() {
        let indexer = Indexer::in_memory(DECIMALS).await.unwrap();
        indexer.apply(1, Utc::now(), &created(9, 1)).await.unwrap();

        indexer.on_replay_start().await.unwrap();
        indexer.handle(&BusEvent::new(2, created(1, 3))).await.unwrap();
        indexer.on_replay_complete().await.unwrap();

        assert!(indexer.transfer(9).await.unwrap().is_none());
        let row = indexer.transfer(1).await.unwrap().unwrap();
        assert_eq!(row.created_seq, 2);
        assert_eq!(row.amount_units, "3");
    }
}
