//! nft-ledger: run a JSON transaction script against a fresh token ledger.
//!
//! Usage:
//! ```bash
//! nft-ledger script.json
//! nft-ledger script.json --log-format pretty --dump-log events.jsonl
//! NFT_LEDGER_ADMIN=0xadad… nft-ledger script-without-admin.json
//! ```
//!
//! Each call's outcome is printed to stdout as one JSON line; logs go to stderr.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use nftledger_core::Address;
use nftledger_infra::LedgerConfig;
use nftledger_infra::config::{ADMIN_VAR, LOG_FORMAT_VAR};
use nftledger_observability::LogFormat;

mod script;

use script::Script;

/// Run scripted calls against an in-memory token ledger
#[derive(Parser)]
#[command(name = "nft-ledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON script
    script: PathBuf,

    /// Log output format (json or pretty); overrides NFT_LEDGER_LOG_FORMAT
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Write the committed event log here as JSON lines
    #[arg(long)]
    dump_log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let text = fs::read_to_string(&cli.script)
        .with_context(|| format!("failed to read {}", cli.script.display()))?;
    let script: Script = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid script", cli.script.display()))?;

    let config = resolve_config(script.admin, cli.log_format, |key| std::env::var(key).ok())?;
    nftledger_observability::init_with(config.log_format);
    tracing::info!(admin = %config.admin, calls = script.calls.len(), "running script");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let report = script::run(&script, config.admin, &mut out)?;
    out.flush()?;

    if let Some(path) = &cli.dump_log {
        let mut file = BufWriter::new(
            fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        );
        for event in &report.log {
            serde_json::to_writer(&mut file, event)?;
            writeln!(file)?;
        }
        file.flush()?;
    }

    tracing::info!(
        calls = report.outcomes.len(),
        rejected = report.failures(),
        events = report.log.len(),
        "script complete"
    );
    Ok(())
}

/// Admin from the script, else from the environment. Format from the flag, else the
/// environment; when the flag is given the environment value is never read.
fn resolve_config(
    script_admin: Option<Address>,
    log_format: Option<LogFormat>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<LedgerConfig> {
    let mut config = LedgerConfig::from_lookup(|key| match key {
        ADMIN_VAR => script_admin.map(|a| a.to_string()).or_else(|| env(key)),
        LOG_FORMAT_VAR if log_format.is_some() => None,
        _ => env(key),
    })
    .context("failed to resolve ledger configuration")?;

    if let Some(format) = log_format {
        config.log_format = format;
    }
    Ok(config)
}
