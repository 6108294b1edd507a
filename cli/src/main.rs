//! auditchain CLI — inspect and manage the audit ledger.
//!
//! Usage:
//! ```bash
//! auditchain stats  --db audit_chain.db
//! auditchain record trade '{"symbol": "BTC/USD", "qty": 1}' --db audit_chain.db
//! auditchain verify --db audit_chain.db
//! ```

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, bail, Context, Result};
use tracing_subscriber::EnvFilter;

use auditchain_core::{
    generate_audit_report, parse_timestamp, LedgerConfig, RecordType, ReportKind, TrailFilter,
};
use auditchain_plugin::AuditLedger;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let code = match run(&args[1], &args[2..]).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    process::exit(code);
}

async fn run(command: &str, args: &[String]) -> Result<i32> {
    match command {
        "stats" => cmd_stats(args).await,
        "verify" => cmd_verify(args).await,
        "trail" => cmd_trail(args).await,
        "report" => cmd_report(args).await,
        "block" => cmd_block(args).await,
        "record" => cmd_record(args).await,
        "mine" => cmd_mine(args).await,
        "info" => {
            cmd_info();
            Ok(0)
        }
        "version" | "--version" | "-V" => {
            println!("auditchain {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(0)
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            Ok(1)
        }
    }
}

fn print_usage() {
    println!("auditchain {}", env!("CARGO_PKG_VERSION"));
    println!("Tamper-evident audit ledger for trading systems\n");
    println!("USAGE:");
    println!("    auditchain <COMMAND> [OPTIONS] --db <PATH>\n");
    println!("COMMANDS:");
    println!("    stats                     Show chain statistics");
    println!("    verify                    Verify chain integrity (exit 1 on failure)");
    println!("    trail                     Print the audit trail, newest first");
    println!("                                [--type <TYPE>] [--since <TIME>] [--until <TIME>] [--limit <N>]");
    println!("    report                    Generate an audit report [--detailed] [--type <TYPE>]");
    println!("    block <INDEX|HASH>        Show a single block");
    println!("    record <TYPE> <JSON>      Queue a record and seal it immediately");
    println!("    mine                      Seal the pending queue into a block");
    println!("    info                      Show Auditchain configuration info");
    println!("    version                   Print version");
    println!("    help                      Print this help\n");
    println!("OPTIONS:");
    println!("    --db <PATH>               SQLite ledger file (default: audit_chain.db)");
}

fn cmd_info() {
    println!("Auditchain v{}", env!("CARGO_PKG_VERSION"));
    println!("  Default mining interval: 300s");
    println!("  Default difficulty: 2 leading zeros");
    println!("  Default trail limit: 100 records");
    println!("  Record types: trade, order, system_change, login, config_change");
    println!("  Storage backends: memory, SQLite (feature: sqlite)");
}

// ─── Option parsing ──────────────────────────────────────────────────────────

/// Flag-style options shared by the commands, parsed from whatever follows
/// the positional arguments.
struct Options {
    db: PathBuf,
    record_type: Option<RecordType>,
    since: Option<String>,
    until: Option<String>,
    limit: Option<usize>,
    detailed: bool,
    positional: Vec<String>,
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options {
        db: PathBuf::from("audit_chain.db"),
        record_type: None,
        since: None,
        until: None,
        limit: None,
        detailed: false,
        positional: Vec::new(),
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--db" => options.db = PathBuf::from(value_of(&mut iter, "--db")?),
            "--type" => {
                options.record_type = Some(
                    value_of(&mut iter, "--type")?
                        .parse()
                        .map_err(|e| anyhow!("{e}"))?,
                )
            }
            "--since" => options.since = Some(value_of(&mut iter, "--since")?.to_string()),
            "--until" => options.until = Some(value_of(&mut iter, "--until")?.to_string()),
            "--limit" => {
                options.limit = Some(
                    value_of(&mut iter, "--limit")?
                        .parse()
                        .context("--limit expects a number")?,
                )
            }
            "--detailed" => options.detailed = true,
            other if other.starts_with("--") => bail!("unknown option: {other}"),
            positional => options.positional.push(positional.to_string()),
        }
    }
    Ok(options)
}

fn value_of<'a>(iter: &mut std::slice::Iter<'a, String>, flag: &str) -> Result<&'a str> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{flag} expects a value"))
}

fn trail_filter(options: &Options) -> Result<TrailFilter> {
    let mut filter = TrailFilter {
        record_type: options.record_type,
        ..Default::default()
    };
    if let Some(since) = &options.since {
        filter.start_time = Some(parse_timestamp(since)?);
    }
    if let Some(until) = &options.until {
        filter.end_time = Some(parse_timestamp(until)?);
    }
    if let Some(limit) = options.limit {
        filter.limit = limit;
    }
    Ok(filter)
}

/// Open the ledger read-mostly: no background miner, so the CLI never races
/// a host process over who seals the queue.
async fn open_ledger(options: &Options) -> Result<AuditLedger> {
    let config = LedgerConfig {
        auto_mine: false,
        db_path: Some(options.db.clone()),
        ..Default::default()
    };
    let ledger = AuditLedger::initialize(config)
        .await
        .with_context(|| format!("failed to open ledger at {}", options.db.display()))?;
    Ok(ledger)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn cmd_stats(args: &[String]) -> Result<i32> {
    let options = parse_options(args)?;
    let ledger = open_ledger(&options).await?;
    print_json(&ledger.get_chain_stats().await)?;
    Ok(0)
}

async fn cmd_verify(args: &[String]) -> Result<i32> {
    let options = parse_options(args)?;
    let ledger = open_ledger(&options).await?;
    if ledger.verify_chain_integrity().await {
        println!("chain is valid");
        Ok(0)
    } else {
        println!("chain integrity FAILED");
        Ok(1)
    }
}

async fn cmd_trail(args: &[String]) -> Result<i32> {
    let options = parse_options(args)?;
    let filter = trail_filter(&options)?;
    let ledger = open_ledger(&options).await?;
    print_json(&ledger.get_audit_trail(&filter).await)?;
    Ok(0)
}

async fn cmd_report(args: &[String]) -> Result<i32> {
    let options = parse_options(args)?;
    let kind = if options.detailed {
        ReportKind::Detailed
    } else {
        ReportKind::Summary
    };
    let filter = TrailFilter {
        limit: usize::MAX, // reports cover everything the filter admits
        ..trail_filter(&options)?
    };
    let ledger = open_ledger(&options).await?;
    let records = ledger.get_audit_trail(&filter).await;
    print_json(&generate_audit_report(&records, kind))?;
    Ok(0)
}

async fn cmd_block(args: &[String]) -> Result<i32> {
    let options = parse_options(args)?;
    let Some(target) = options.positional.first() else {
        bail!("block expects an index or hash");
    };
    let ledger = open_ledger(&options).await?;
    let block = match target.parse::<u64>() {
        Ok(index) => ledger.get_block(index).await,
        Err(_) => ledger.get_block_by_hash(target).await,
    };
    match block {
        Some(block) => {
            print_json(&block)?;
            Ok(0)
        }
        None => {
            eprintln!("block not found: {target}");
            Ok(1)
        }
    }
}

async fn cmd_record(args: &[String]) -> Result<i32> {
    let options = parse_options(args)?;
    let [kind, data] = options.positional.as_slice() else {
        bail!("record expects a type and a JSON payload");
    };
    let kind: RecordType = kind.parse().map_err(|e| anyhow!("{e}"))?;
    let data: serde_json::Value =
        serde_json::from_str(data).context("payload is not valid JSON")?;

    let ledger = open_ledger(&options).await?;
    let queued = match kind {
        RecordType::Trade => ledger.record_trade(data).await,
        RecordType::Order => ledger.record_order(data).await,
        RecordType::SystemChange => ledger.record_system_change(data).await,
        RecordType::Login => ledger.record_login(data).await,
        RecordType::ConfigChange => ledger.record_config_change(data).await,
    };
    if !queued {
        bail!("record rejected");
    }
    match ledger.force_mine().await {
        Some(block) => {
            println!("sealed block {} ({})", block.index, block.hash);
            Ok(0)
        }
        None => bail!("sealing failed"),
    }
}

async fn cmd_mine(args: &[String]) -> Result<i32> {
    let options = parse_options(args)?;
    let ledger = open_ledger(&options).await?;
    match ledger.force_mine().await {
        Some(block) => {
            println!(
                "sealed block {} with {} transactions ({})",
                block.index,
                block.transactions().len(),
                block.hash
            );
            Ok(0)
        }
        None => {
            println!("nothing to mine");
            Ok(0)
        }
    }
}
