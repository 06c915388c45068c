//! Trinetra CLI - Main entry point

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use trinetra_approval::RequestKind;
use trinetra_core::Address;
use trinetra_rpc::{commands, AppContext, DeployConfig};

#[derive(Parser)]
#[command(name = "trinetra")]
#[command(about = "Trinetra - Multi-signature token authorization", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Acting account: 0x-prefixed hex, or a label hashed into an address
    #[arg(short, long, global = true, env = "TRINETRA_CALLER", value_parser = parse_account)]
    caller: Option<Address>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Transfer,
    Burn,
}

impl From<Kind> for RequestKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Transfer => RequestKind::Transfer,
            Kind::Burn => RequestKind::Burn,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the engine (from a TOML file or flags)
    Deploy {
        /// Deployment config file
        #[arg(long, conflicts_with_all = ["admin", "supply", "quorum"])]
        config: Option<PathBuf>,
        /// Administrator (defaults to --caller)
        #[arg(long, value_parser = parse_account)]
        admin: Option<Address>,
        /// Initial supply in whole tokens
        #[arg(long, default_value = "1000000")]
        supply: u64,
        /// Required signatures
        #[arg(long, default_value = "2")]
        quorum: u32,
        /// Signer to add after deployment (repeatable)
        #[arg(long = "signer", value_parser = parse_account)]
        signers: Vec<Address>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        decimals: Option<u8>,
    },

    /// Add a signer (administrator only)
    AddSigner {
        #[arg(value_parser = parse_account)]
        account: Address,
    },

    /// Remove a signer (administrator only)
    RemoveSigner {
        #[arg(value_parser = parse_account)]
        account: Address,
    },

    /// Check whether an account is a signer
    IsSigner {
        #[arg(value_parser = parse_account)]
        account: Address,
    },

    /// Request a transfer from the caller
    Transfer {
        /// Recipient
        #[arg(value_parser = parse_account)]
        to: Address,
        /// Amount in whole-token units (fractions allowed)
        amount: Decimal,
        /// Reference of an uploaded attachment
        #[arg(long, required_unless_present = "file", conflicts_with = "file")]
        attachment: Option<String>,
        /// Upload this file and use its reference
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Approve a transfer request (signers only)
    ApproveTransfer { id: u64 },

    /// Request a burn of the caller's tokens
    Burn {
        /// Amount in whole-token units (fractions allowed)
        amount: Decimal,
        /// Where the off-ledger payout goes
        #[arg(long)]
        bank_details: String,
    },

    /// Approve a burn request (signers only)
    ApproveBurn { id: u64 },

    /// Check balance for an account
    Balance {
        #[arg(value_parser = parse_account)]
        account: Address,
    },

    /// Show token metadata, supply and signers
    Supply,

    /// Show one request (mirror first, engine as fallback)
    Request {
        #[arg(value_enum)]
        kind: Kind,
        id: u64,
    },

    /// List pending requests from the mirror
    Pending {
        #[arg(value_enum, default_value = "transfer")]
        kind: Kind,
    },

    /// List completed requests from the mirror
    Completed {
        #[arg(value_enum, default_value = "transfer")]
        kind: Kind,
    },

    /// Store a supporting document
    Upload { path: PathBuf },

    /// List journaled events by sequence range
    Events {
        #[arg(long, default_value = "1")]
        from: u64,
        #[arg(long)]
        to: Option<u64>,
    },

    /// Replay the journal (rebuild engine state and the mirror)
    Replay {
        /// Delete the mirror database before replay
        #[arg(long)]
        reset: bool,
    },

    /// Audit supply conservation and the journal
    Audit,
}

/// Hex addresses parse as-is; anything else is treated as a label
fn parse_account(value: &str) -> Result<Address, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("account must not be empty".to_string());
    }
    if value.starts_with("0x") || value.starts_with("0X") {
        return value.parse().map_err(|e| format!("{}", e));
    }
    Ok(Address::from_label(value))
}

fn require_caller(caller: Option<Address>) -> anyhow::Result<Address> {
    caller.ok_or_else(|| anyhow::anyhow!("No caller: pass --caller or set TRINETRA_CALLER"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Create application context
    let mut ctx = AppContext::new(&cli.data).await?;

    match cli.command {
        Commands::Deploy {
            config,
            admin,
            supply,
            quorum,
            signers,
            name,
            symbol,
            decimals,
        } => {
            let mut deploy = match config {
                Some(path) => DeployConfig::load_file(path)?,
                None => {
                    let administrator = match admin {
                        Some(admin) => admin,
                        None => require_caller(cli.caller)?,
                    };
                    DeployConfig::new(administrator, supply, quorum)
                }
            };
            deploy.signers.extend(signers);

            if let Some(name) = name {
                deploy.token.name = name;
            }
            if let Some(symbol) = symbol {
                deploy.token.symbol = symbol;
            }
            if let Some(decimals) = decimals {
                deploy.token.decimals = decimals;
            }

            commands::deploy(&mut ctx, &deploy).await?;
        }

        Commands::AddSigner { account } => {
            commands::add_signer(&mut ctx, require_caller(cli.caller)?, account).await?;
        }

        Commands::RemoveSigner { account } => {
            commands::remove_signer(&mut ctx, require_caller(cli.caller)?, account).await?;
        }

        Commands::IsSigner { account } => {
            commands::is_signer(&ctx, account).await?;
        }

        Commands::Transfer {
            to,
            amount,
            attachment,
            file,
        } => {
            let caller = require_caller(cli.caller)?;
            let attachment_ref = match (attachment, file) {
                (Some(reference), _) => reference,
                (None, Some(path)) => commands::upload(&ctx, &path).await?,
                (None, None) => anyhow::bail!("No file uploaded."),
            };
            commands::transfer(&mut ctx, caller, to, amount, attachment_ref).await?;
        }

        Commands::ApproveTransfer { id } => {
            commands::approve_transfer(&mut ctx, require_caller(cli.caller)?, id).await?;
        }

        Commands::Burn { amount, bank_details } => {
            commands::burn(&mut ctx, require_caller(cli.caller)?, amount, bank_details).await?;
        }

        Commands::ApproveBurn { id } => {
            commands::approve_burn(&mut ctx, require_caller(cli.caller)?, id).await?;
        }

        Commands::Balance { account } => {
            commands::balance(&ctx, account).await?;
        }

        Commands::Supply => {
            commands::supply(&ctx).await?;
        }

        Commands::Request { kind, id } => {
            commands::request(&ctx, kind.into(), id).await?;
        }

        Commands::Pending { kind } => {
            commands::list(&ctx, kind.into(), false).await?;
        }

        Commands::Completed { kind } => {
            commands::list(&ctx, kind.into(), true).await?;
        }

        Commands::Upload { path } => {
            commands::upload(&ctx, &path).await?;
        }

        Commands::Events { from, to } => {
            commands::events(&ctx, from, to).await?;
        }

        Commands::Replay { reset } => {
            let mirror_path = ctx.mirror_path().to_path_buf();
            let data_path = cli.data.clone();

            // Drop existing context to release the SQLite connection
            drop(ctx);

            if reset {
                println!("🗑️  Dropping mirror...");
                if mirror_path.exists() {
                    std::fs::remove_file(&mirror_path)?;
                    println!("   Deleted {}", mirror_path.display());
                }
            }

            // Recreate context to replay
            let new_ctx = AppContext::new(&data_path).await?;
            println!("✅ Replayed {} records", new_ctx.last_sequence());
        }

        Commands::Audit => {
            commands::audit(&ctx).await?;
        }
    }

    Ok(())
}
