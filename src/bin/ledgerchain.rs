#![forbid(unsafe_code)]
//! Demo driver: signs a few transfers, mines them and checks the chain.

use clap::Parser;
use colored::*;
use ledgerchain::blockchain::Blockchain;
use ledgerchain::config::load_config;
use ledgerchain::crypto::{Secp256k1Scheme, SignatureScheme};
use ledgerchain::transaction::TransferDraft;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "ledgerchain", about = "Mine a local proof-of-work ledger")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "ledgerchain.toml")]
    config: PathBuf,

    /// Overrides chain.difficulty from the configuration
    #[arg(short, long)]
    difficulty: Option<u32>,

    /// Number of mining rounds
    #[arg(short, long, default_value_t = 3)]
    rounds: u32,

    /// Overrides miner.timeout_secs from the configuration
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the final block list as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(difficulty) = args.difficulty {
        config.chain.difficulty = difficulty;
    }
    if args.timeout_secs.is_some() {
        config.miner.timeout_secs = args.timeout_secs;
    }
    config.validate()?;

    let scheme = Arc::new(Secp256k1Scheme::new());
    let mut chain = Blockchain::with_config(&config.chain, scheme.clone())?;

    let alice = scheme.generate_keypair();
    let bob = scheme.generate_keypair();
    let miner = scheme.generate_keypair();

    println!("{}", "LedgerChain".bright_cyan().bold());
    println!("  curve:      {}", scheme.curve_name());
    println!("  difficulty: {}", chain.difficulty());
    println!("  reward:     {}", chain.miner_reward());
    println!("  genesis:    {}", chain.latest_block().hash.dimmed());
    println!();

    for round in 1..=args.rounds {
        let amount = u64::from(round) * 10;
        let transfer = TransferDraft::new(alice.public_key_hex(), bob.public_key_hex(), amount)
            .sign(&*scheme, &alice)?;
        chain.add_transaction(transfer.into())?;

        let control = config.miner.mining_control();
        let started = Instant::now();
        let block = chain.mine_transaction_pool_with(&miner.public_key_hex(), &control)?;

        println!(
            "{} #{}  nonce {}  {:.3}s",
            "⛏  mined".bright_green(),
            round,
            block.nonce,
            started.elapsed().as_secs_f64()
        );
        println!("    hash     {}", block.hash.bright_white());
        println!("    previous {}", block.previous_hash.dimmed());
    }

    println!();
    if chain.validate_chain() {
        println!("{} ({} blocks)", "chain valid".bright_green().bold(), chain.len());
    } else {
        println!("{}", "chain INVALID".bright_red().bold());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(chain.blocks())?);
    }

    Ok(())
}
