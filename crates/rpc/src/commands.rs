//! CLI commands

use anyhow::{anyhow, bail};
use rust_decimal::Decimal;
use std::path::Path;
use trinetra_approval::RequestKind;
use trinetra_core::{Address, TokenAmount};
use trinetra_events::{EngineCommand, EngineEvent, EventReader, JournalRecord};

use crate::attachment::AttachmentStore;
use crate::config::DeployConfig;
use crate::context::AppContext;

/// Render an amount as `<units> <symbol>`
fn display_amount(ctx: &AppContext, amount: TokenAmount) -> Result<String, anyhow::Error> {
    let metadata = ctx.engine()?.metadata();
    Ok(format!("{} {}", amount.to_units(metadata.decimals)?, metadata.symbol))
}

/// Scale a decimal token quantity to the smallest unit
fn token_amount(ctx: &AppContext, amount: Decimal) -> Result<TokenAmount, anyhow::Error> {
    let decimals = ctx.engine()?.metadata().decimals;
    Ok(TokenAmount::from_units(amount, decimals)?)
}

/// Id of the request a creation record opened
fn created_id(record: &JournalRecord) -> Result<u64, anyhow::Error> {
    record
        .events
        .first()
        .map(EngineEvent::request_id)
        .ok_or_else(|| anyhow!("no creation event at sequence {}", record.sequence))
}

/// Deploy the engine
pub async fn deploy(ctx: &mut AppContext, config: &DeployConfig) -> Result<(), anyhow::Error> {
    if ctx.is_deployed() {
        bail!("Engine already deployed (sequence = {})", ctx.last_sequence());
    }

    ctx.deploy(config).await?;

    let supply = ctx.engine()?.total_supply();
    println!(
        "✅ Deployed {} ({}) with supply {}",
        config.token.name,
        config.token.symbol,
        display_amount(ctx, supply)?
    );
    println!("   Administrator: {}", config.administrator);
    println!("   Required signatures: {}", config.required_signatures);
    for signer in &config.signers {
        println!("   Signer: {}", signer);
    }
    Ok(())
}

pub async fn add_signer(ctx: &mut AppContext, caller: Address, candidate: Address) -> Result<(), anyhow::Error> {
    let already = ctx.engine()?.is_signer(&candidate);
    let record = ctx.run(caller, EngineCommand::AddSigner { candidate }).await?;

    if already {
        println!("ℹ️  {} is already a signer (seq: {})", candidate, record.sequence);
    } else {
        println!("✅ Added signer {} (seq: {})", candidate, record.sequence);
    }
    Ok(())
}

pub async fn remove_signer(ctx: &mut AppContext, caller: Address, target: Address) -> Result<(), anyhow::Error> {
    let was_signer = ctx.engine()?.is_signer(&target);
    let record = ctx.run(caller, EngineCommand::RemoveSigner { target }).await?;

    if was_signer {
        println!("✅ Removed signer {} (seq: {})", target, record.sequence);
    } else {
        println!("ℹ️  {} was not a signer (seq: {})", target, record.sequence);
    }
    Ok(())
}

pub async fn is_signer(ctx: &AppContext, account: Address) -> Result<(), anyhow::Error> {
    let engine = ctx.engine()?;
    if engine.is_signer(&account) {
        println!("{} is a signer", account);
    } else if account == engine.administrator() {
        println!("{} is the administrator (not a signer)", account);
    } else {
        println!("{} is not a signer", account);
    }
    Ok(())
}

/// Open a transfer request
pub async fn transfer(
    ctx: &mut AppContext,
    caller: Address,
    to: Address,
    amount: Decimal,
    attachment_ref: String,
) -> Result<(), anyhow::Error> {
    let amount = token_amount(ctx, amount)?;
    let record = ctx
        .run(
            caller,
            EngineCommand::InitiateTransfer {
                to,
                amount,
                attachment_ref,
            },
        )
        .await?;
    let id = created_id(&record)?;

    println!(
        "✅ Transfer request {} created: {} from {} to {} (seq: {})",
        id,
        display_amount(ctx, amount)?,
        caller,
        to,
        record.sequence
    );
    Ok(())
}

pub async fn approve_transfer(ctx: &mut AppContext, caller: Address, id: u64) -> Result<(), anyhow::Error> {
    let record = ctx.run(caller, EngineCommand::ApproveTransfer { id }).await?;

    let completed = record
        .events
        .iter()
        .any(|e| matches!(e, EngineEvent::TransferCompleted { .. }));
    if completed {
        println!("✅ Transfer {} approved and completed (seq: {})", id, record.sequence);
    } else {
        let engine = ctx.engine()?;
        let approvals = engine
            .transfer_request(id)
            .map(|r| r.approvals.count())
            .unwrap_or_default();
        println!(
            "✅ Approval recorded for transfer {} ({}/{}) (seq: {})",
            id,
            approvals,
            engine.required_signatures(),
            record.sequence
        );
    }
    Ok(())
}

/// Open a burn request
pub async fn burn(
    ctx: &mut AppContext,
    caller: Address,
    amount: Decimal,
    bank_details: String,
) -> Result<(), anyhow::Error> {
    let amount = token_amount(ctx, amount)?;
    let record = ctx
        .run(caller, EngineCommand::InitiateBurn { amount, bank_details })
        .await?;
    let id = created_id(&record)?;

    println!(
        "✅ Burn request {} created: {} from {} (seq: {})",
        id,
        display_amount(ctx, amount)?,
        caller,
        record.sequence
    );
    Ok(())
}

pub async fn approve_burn(ctx: &mut AppContext, caller: Address, id: u64) -> Result<(), anyhow::Error> {
    let record = ctx.run(caller, EngineCommand::ApproveBurn { id }).await?;

    let completed = record
        .events
        .iter()
        .any(|e| matches!(e, EngineEvent::BurnRequestApproved { .. }));
    if completed {
        let supply = ctx.engine()?.total_supply();
        println!(
            "✅ Burn {} approved and executed, supply now {} (seq: {})",
            id,
            display_amount(ctx, supply)?,
            record.sequence
        );
    } else {
        let engine = ctx.engine()?;
        let approvals = engine
            .burn_request(id)
            .map(|r| r.approvals.count())
            .unwrap_or_default();
        println!(
            "✅ Approval recorded for burn {} ({}/{}) (seq: {})",
            id,
            approvals,
            engine.required_signatures(),
            record.sequence
        );
    }
    Ok(())
}

pub async fn balance(ctx: &AppContext, account: Address) -> Result<(), anyhow::Error> {
    let balance = ctx.engine()?.balance_of(&account);
    println!("Balance for {}: {}", account, display_amount(ctx, balance)?);
    Ok(())
}

/// Token metadata, supply and signer set
pub async fn supply(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let engine = ctx.engine()?;
    let metadata = engine.metadata();

    println!("{} ({})", metadata.name, metadata.symbol);
    println!("   Decimals: {}", metadata.decimals);
    println!("   Total supply: {}", display_amount(ctx, engine.total_supply())?);
    println!("   Administrator: {}", engine.administrator());
    println!("   Required signatures: {}", engine.required_signatures());
    let signers = engine.signers();
    if signers.is_empty() {
        println!("   Signers: (none)");
    }
    for signer in signers {
        println!("   Signer: {}", signer);
    }
    Ok(())
}

/// Show one request, from the mirror when it has the row
///
/// Falls back to the engine when the mirror is unavailable or has not
/// seen the creation event yet. The stalled flag always comes from the
/// engine.
pub async fn request(ctx: &AppContext, kind: RequestKind, id: u64) -> Result<(), anyhow::Error> {
    let engine = ctx.engine()?;
    let required = engine.required_signatures();
    let symbol = &engine.metadata().symbol;

    let mirrored = match (kind, ctx.indexer()) {
        (RequestKind::Transfer, Some(indexer)) => match indexer.transfer(id).await {
            Ok(Some(row)) if !row.is_placeholder() => {
                println!("Transfer request {}", id);
                println!("   From: {}", row.from);
                println!("   To: {}", row.to);
                println!("   Amount: {} {}", row.amount_units, symbol);
                println!("   Attachment: {}", row.attachment_ref);
                println!("   Status: {}", row.status);
                println!("   Approvals: {}/{}", row.approval_count, required);
                for signer in &row.approvers {
                    println!("     - {}", signer);
                }
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::warn!(id, error = %e, "Mirror lookup failed");
                false
            }
        },
        (RequestKind::Burn, Some(indexer)) => match indexer.burn(id).await {
            Ok(Some(row)) => {
                let approvals = engine.burn_request(id).map(|r| r.approvals.count()).unwrap_or(0);
                println!("Burn request {}", id);
                println!("   From: {}", row.from);
                println!("   Amount: {} {}", row.amount_units, symbol);
                println!("   Bank details: {}", row.bank_details);
                println!("   Status: {}", row.status);
                println!("   Approvals: {}/{}", approvals, required);
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(id, error = %e, "Mirror lookup failed");
                false
            }
        },
        (_, None) => false,
    };

    let stalled = match kind {
        RequestKind::Transfer => engine.transfer_request(id).map(|r| r.is_stalled(required)),
        RequestKind::Burn => engine.burn_request(id).map(|r| r.is_stalled(required)),
    };

    if !mirrored {
        engine_request(ctx, kind, id)?;
    }
    if stalled == Some(true) {
        println!("⚠️  Stalled: quorum reached but the sender balance no longer covers the amount");
    }
    Ok(())
}

/// Print a request as the engine holds it
fn engine_request(ctx: &AppContext, kind: RequestKind, id: u64) -> Result<(), anyhow::Error> {
    let engine = ctx.engine()?;
    let required = engine.required_signatures();

    let (status, approvals) = match kind {
        RequestKind::Transfer => {
            let request = engine
                .transfer_request(id)
                .ok_or_else(|| anyhow!("transfer request {} not found", id))?;
            println!("Transfer request {}", id);
            println!("   From: {}", request.from);
            println!("   To: {}", request.to);
            println!("   Amount: {}", display_amount(ctx, request.amount)?);
            println!("   Attachment: {}", request.attachment_ref);
            (request.status, request.approvals.clone())
        }
        RequestKind::Burn => {
            let request = engine
                .burn_request(id)
                .ok_or_else(|| anyhow!("burn request {} not found", id))?;
            println!("Burn request {}", id);
            println!("   From: {}", request.from);
            println!("   Amount: {}", display_amount(ctx, request.amount)?);
            println!("   Bank details: {}", request.bank_details);
            (request.status, request.approvals.clone())
        }
    };

    println!("   Status: {}", status);
    println!("   Approvals: {}/{}", approvals.count(), required);
    for signer in approvals.signers() {
        println!("     - {}", signer);
    }
    Ok(())
}

/// List requests from the mirror
pub async fn list(ctx: &AppContext, kind: RequestKind, completed: bool) -> Result<(), anyhow::Error> {
    let indexer = ctx
        .indexer()
        .ok_or_else(|| anyhow!("Mirror unavailable at {}", ctx.mirror_path().display()))?;
    let symbol = &ctx.engine()?.metadata().symbol;
    let label = if completed { "Completed" } else { "Pending" };

    match kind {
        RequestKind::Transfer => {
            let rows = if completed {
                indexer.completed_transfers().await?
            } else {
                indexer.pending_transfers().await?
            };
            println!("{} transfers: {}", label, rows.len());
            for row in rows {
                println!(
                    "  #{} {} {} {} -> {} [{} approval(s)] {}",
                    row.id, row.amount_units, symbol, row.from, row.to, row.approval_count, row.attachment_ref
                );
            }
        }
        RequestKind::Burn => {
            let rows = if completed {
                indexer.completed_burns().await?
            } else {
                indexer.pending_burns().await?
            };
            println!("{} burns: {}", label, rows.len());
            for row in rows {
                println!(
                    "  #{} {} {} from {} -> {}",
                    row.id, row.amount_units, symbol, row.from, row.bank_details
                );
            }
        }
    }
    Ok(())
}

/// Store a supporting document and print its reference
pub async fn upload(ctx: &AppContext, path: &Path) -> Result<String, anyhow::Error> {
    let bytes = std::fs::read(path)?;
    let reference = ctx.attachments.put(&bytes)?;
    println!("✅ Uploaded {} ({} bytes)", path.display(), bytes.len());
    println!("   Reference: {}", reference);
    Ok(reference)
}

/// Print journaled events whose record sequence lies in `from..=to`
pub async fn events(ctx: &AppContext, from: u64, to: Option<u64>) -> Result<(), anyhow::Error> {
    let to = to.unwrap_or(ctx.last_sequence());
    let reader = EventReader::from_directory(ctx.journal_path())?;
    let events = reader.events_in_range(from, to)?;

    println!("Events from seq {} to {}: {}", from, to, events.len());
    for (sequence, event) in events {
        println!("  [{}] {}", sequence, serde_json::to_string(&event)?);
    }
    Ok(())
}

/// Check supply conservation and journal integrity
pub async fn audit(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let reader = EventReader::from_directory(ctx.journal_path())?;
    let records = reader.read_all()?;
    println!("✅ Journal readable ({} records, no sequence gaps)", records.len());

    let audit = ctx.engine()?.audit();
    if audit.is_consistent() {
        println!(
            "✅ Supply conserved: {} across {} holder(s)",
            display_amount(ctx, audit.supply)?,
            audit.holders
        );
    } else {
        println!(
            "❌ Supply mismatch: balances {} != supply {}",
            display_amount(ctx, audit.balances)?,
            display_amount(ctx, audit.supply)?
        );
    }

    let stalled = records.iter().filter(|r| r.failure.is_some()).count();
    if stalled > 0 {
        println!("⚠️  {} journaled approval(s) failed re-validation", stalled);
    }
    Ok(())
}
