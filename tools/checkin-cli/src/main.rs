use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use checkin_core::badges::parse_level;
use checkin_core::config::{
    DEFAULT_PROGRAM_ID, DEFAULT_RPC_URL, ENV_COMMITMENT, ENV_PROGRAM_ID, ENV_RPC_URL,
};
use checkin_core::{CheckInProtocol, Commitment, KeypairSigner, ProtocolConfig, TransactionSigner};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Client for the daily check-in ledger program
#[derive(Parser, Debug)]
#[command(name = "checkin", author, version, about)]
struct Args {
    /// JSON-RPC endpoint
    #[arg(long, global = true, env = ENV_RPC_URL, default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Check-in program id
    #[arg(long, global = true, env = ENV_PROGRAM_ID, default_value = DEFAULT_PROGRAM_ID)]
    program_id: String,

    /// processed, confirmed or finalized
    #[arg(long, global = true, env = ENV_COMMITMENT, default_value = "confirmed")]
    commitment: Commitment,

    /// Keypair file (JSON array of secret key bytes)
    #[arg(short, long, global = true, env = "CHECKIN_KEYPAIR")]
    keypair: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Totals, streak and whether today is still open
    Stats {
        /// Owner address; defaults to the keypair's
        owner: Option<String>,
    },

    /// Check in for today
    CheckIn,

    /// Every badge tier with its unlocked and claimed state
    Badges {
        owner: Option<String>,
    },

    /// Claim the badge for a tier ("2" or "tier2")
    Claim {
        level: String,
    },

    /// The last seven days, oldest first
    History {
        owner: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ProtocolConfig {
        rpc_url: args.rpc_url.clone(),
        program_id: args.program_id.clone(),
        commitment: args.commitment,
    };
    let protocol = CheckInProtocol::from_config(&config)?;
    debug!(endpoint = %config.rpc_url, program = %config.program_id, commitment = %config.commitment, "configured");

    let keypair = args.keypair.as_deref();
    match args.command {
        Command::Stats { owner } => {
            let owner = resolve_owner(owner, keypair)?;
            print_json(&protocol.get_stats(&owner).await?)
        }
        Command::CheckIn => {
            let signer = load_signer(keypair)?;
            print_json(&protocol.check_in(&signer).await?)
        }
        Command::Badges { owner } => {
            let owner = resolve_owner(owner, keypair)?;
            print_json(&protocol.get_badges(&owner).await?)
        }
        Command::Claim { level } => {
            let Some(level) = parse_level(&level) else {
                bail!("badge level {level:?} is not a number");
            };
            let signer = load_signer(keypair)?;
            print_json(&protocol.claim_badge(&signer, level).await?)
        }
        Command::History { owner } => {
            let owner = resolve_owner(owner, keypair)?;
            print_json(&protocol.get_history(&owner).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_signer(path: Option<&Path>) -> Result<KeypairSigner> {
    let path = path.context("this command signs: pass --keypair or set CHECKIN_KEYPAIR")?;
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read keypair {}", path.display()))?;
    Ok(KeypairSigner::from_json(&contents)?)
}

/// Reads need an owner: the argument if given, otherwise the keypair's.
fn resolve_owner(owner: Option<String>, keypair: Option<&Path>) -> Result<String> {
    match owner {
        Some(owner) => Ok(owner),
        None => Ok(load_signer(keypair)
            .context("no owner given")?
            .address()),
    }
}
