//! Spellcards Backend - CLI Entrypoint
//!
//! Run modes:
//!   spellcards health                          - Print node readiness verdict
//!   spellcards broadcast <commit_hex> <spell_hex>
//!                                              - Broadcast a proved package
//!   spellcards mint --to <addr> --value <sats> --funding <txid:vout> --change <addr>
//!                                              - Prove and broadcast a mint
//!   spellcards transfer --card <txid:vout> --to <addr> --value <sats> --funding <txid:vout> --change <addr>
//!                                              - Prove and broadcast a transfer

use std::env;
use std::process::ExitCode;

use spellcards::broadcast::{BroadcastOrchestrator, BroadcastOutcome};
use spellcards::config::SpellcardsConfig;
use spellcards::node::NodeMonitor;
use spellcards::prover::{ProverClient, SpellRequest};
use spellcards::{logging, units};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }
    if matches!(args[1].as_str(), "help" | "--help" | "-h") {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let config = match SpellcardsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_from_config(&config) {
        eprintln!("Warning: {}", e);
    }

    match args[1].as_str() {
        "health" => run_health(&config).await,
        "broadcast" => run_broadcast(&config, &args[2..]).await,
        "mint" => run_mint(&config, &args[2..]).await,
        "transfer" => run_transfer(&config, &args[2..]).await,
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("Spellcards Backend - Bitcoin NFT Gift Cards");
    println!();
    println!("Usage:");
    println!("  spellcards health                               Check full-node readiness");
    println!("  spellcards broadcast <commit_hex> <spell_hex>   Broadcast a proved package");
    println!("  spellcards mint --to <addr> --value <sats> --funding <txid:vout> --change <addr>");
    println!("  spellcards transfer --card <txid:vout> --to <addr> --value <sats> --funding <txid:vout> --change <addr>");
    println!();
    println!("Environment Variables:");
    println!("  SPELLCARDS_NETWORK               mainnet | testnet4 | signet (default: testnet4)");
    println!("  SPELLCARDS_BITCOIN_RPC_URL       Full node JSON-RPC endpoint (optional)");
    println!("  SPELLCARDS_BITCOIN_RPC_USER      RPC Basic-Auth user");
    println!("  SPELLCARDS_BITCOIN_RPC_PASSWORD  RPC Basic-Auth password");
    println!("  SPELLCARDS_BROADCAST_API_KEY     API key for the JSON broadcast vendor");
    println!("  SPELLCARDS_PROVER_URL            Spell prover base URL");
    println!("  SPELLCARDS_TEST_MODE             Set to 1 to bypass readiness gating");
    println!("  SPELLCARDS_LOG_LEVEL             debug | info | warn | error");
}

async fn run_health(config: &SpellcardsConfig) -> ExitCode {
    config.print_summary();

    if !config.rpc.enabled {
        println!();
        println!("No full node configured; broadcasts will use external services.");
        return ExitCode::SUCCESS;
    }

    let monitor = NodeMonitor::new(config.rpc.clone());
    let health = monitor.health().await;
    let readiness = spellcards::node::evaluate(&health, config.test_mode);

    println!();
    println!("Node health:");
    println!("  Connected: {}", health.connected);
    println!("  Loading: {}", health.loading);
    println!("  Chain: {}", health.chain);
    println!("  Blocks: {} / {}", health.blocks, health.headers);
    println!("  Verification: {:.2}%", health.verification_progress * 100.0);
    println!("  IBD: {}", health.initial_block_download);
    println!("  Peers: {}", health.connections);
    if health.pruned {
        println!("  Pruned at: {:?}", health.prune_height);
    }
    println!("  Mempool: {} txs, {} bytes", health.mempool_size, health.mempool_bytes);
    println!();
    println!("Ready: {} ({})", readiness.ready, readiness.reason);

    if readiness.ready {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_broadcast(config: &SpellcardsConfig, args: &[String]) -> ExitCode {
    if args.len() < 2 {
        eprintln!("broadcast requires <commit_hex> <spell_hex>");
        return ExitCode::FAILURE;
    }

    let orchestrator = BroadcastOrchestrator::from_config(config);
    report_outcome(orchestrator.broadcast_package(&args[0], &args[1]).await)
}

async fn run_mint(config: &SpellcardsConfig, args: &[String]) -> ExitCode {
    let (to, value, funding, change, _card) = match parse_spell_args(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Minting {} gift card to {}", units::format_sats(value), to);
    let request = SpellRequest::mint(to, value, funding, change);
    prove_and_broadcast(config, &request).await
}

async fn run_transfer(config: &SpellcardsConfig, args: &[String]) -> ExitCode {
    let (to, value, funding, change, card) = match parse_spell_args(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let card = match card {
        Some(card) => card,
        None => {
            eprintln!("transfer requires --card <txid:vout>");
            return ExitCode::FAILURE;
        }
    };

    println!("Transferring card {} to {}", card, to);
    let request = SpellRequest::transfer(card, to, value, funding, change);
    prove_and_broadcast(config, &request).await
}

async fn prove_and_broadcast(config: &SpellcardsConfig, request: &SpellRequest) -> ExitCode {
    let prover = ProverClient::new(&config.prover_url);

    let package = match prover.prove(request).await {
        Ok(package) => package,
        Err(e) => {
            eprintln!("Prover error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Prover returned package (commit {} bytes, spell {} bytes)",
        package.commit_tx.len() / 2,
        package.spell_tx.len() / 2
    );

    let orchestrator = BroadcastOrchestrator::from_config(config);
    report_outcome(
        orchestrator
            .broadcast_package(&package.commit_tx, &package.spell_tx)
            .await,
    )
}

fn report_outcome(
    result: Result<BroadcastOutcome, spellcards::broadcast::BroadcastError>,
) -> ExitCode {
    match result {
        Ok(BroadcastOutcome::Success {
            commit_txid,
            spell_txid,
            strategy,
            commit_in_mempool,
            spell_in_mempool,
        }) => {
            println!("Broadcast succeeded via {} strategy", strategy);
            println!("  Commit: {} (in mempool: {})", commit_txid, commit_in_mempool);
            println!("  Spell:  {} (in mempool: {})", spell_txid, spell_in_mempool);
            ExitCode::SUCCESS
        }
        Ok(BroadcastOutcome::Partial {
            commit_txid,
            spell_error,
            commit_in_mempool,
        }) => {
            eprintln!("Partial broadcast: commit is out, spell failed");
            eprintln!("  Commit: {} (in mempool: {})", commit_txid, commit_in_mempool);
            eprintln!("  Spell error: {}", spell_error);
            eprintln!("Keep the commit txid; retry the spell once the commit confirms.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Broadcast failed [{}]: {}", e.error_code(), e);
            if e.is_retryable() {
                eprintln!("This condition is retryable; try again shortly.");
            }
            ExitCode::FAILURE
        }
    }
}

/// Parse `--to/--value/--funding/--change/--card` flags
fn parse_spell_args(
    args: &[String],
) -> Result<(String, u64, String, String, Option<String>), String> {
    let mut to = None;
    let mut value = None;
    let mut funding = None;
    let mut change = None;
    let mut card = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--to" if i + 1 < args.len() => {
                to = Some(args[i + 1].clone());
                i += 2;
            }
            "--value" if i + 1 < args.len() => {
                value = args[i + 1].parse().ok();
                i += 2;
            }
            "--funding" if i + 1 < args.len() => {
                funding = Some(args[i + 1].clone());
                i += 2;
            }
            "--change" if i + 1 < args.len() => {
                change = Some(args[i + 1].clone());
                i += 2;
            }
            "--card" if i + 1 < args.len() => {
                card = Some(args[i + 1].clone());
                i += 2;
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }

    Ok((
        to.ok_or("missing --to <addr>")?,
        value.ok_or("missing or invalid --value <sats>")?,
        funding.ok_or("missing --funding <txid:vout>")?,
        change.ok_or("missing --change <addr>")?,
        card,
    ))
}
