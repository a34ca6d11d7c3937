//! CLI entry point for warden-replay: offline scoring of captured sessions.
//!
//! Reads host lifecycle events as JSONL (one event per line), drives a
//! trust engine, and prints the score for every completed run.

use std::io::{BufRead, BufReader};

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use warden_core::WardenConfig;
use warden_engine::present;
use warden_engine::TrustEngine;

#[derive(Parser)]
#[command(name = "warden-replay")]
#[command(about = "Replay captured agent lifecycle events through the trust engine")]
struct Cli {
    /// Path to a JSONL event log, or `-` for stdin.
    #[arg(short, long, default_value = "-")]
    events: String,

    /// Config file prefix (default: warden).
    #[arg(short, long, default_value = "warden")]
    config: String,

    /// Comma-separated tool allow-list override.
    #[arg(long)]
    allowed_tools: Option<String>,

    /// Disable report dispatch even if an endpoint is configured.
    #[arg(long)]
    no_report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();

    let mut config = WardenConfig::load(&cli.config)?;
    if let Some(tools) = &cli.allowed_tools {
        config.allowed_tools = tools
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
    }
    if cli.no_report {
        config.endpoint = None;
    }
    // Replay prints scores itself; skip the engine's console logging.
    config.log_to_console = false;

    let mut engine = TrustEngine::new(config);
    let mut completed = 0usize;
    let mut skipped = 0usize;

    let reader: Box<dyn BufRead> = if cli.events == "-" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        Box::new(BufReader::new(std::fs::File::open(&cli.events)?))
    };

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let raw: serde_json::Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "Skipping unparseable line");
                skipped += 1;
                continue;
            }
        };

        if let Some(score) = engine.handle_raw(&raw) {
            completed += 1;
            println!("{}", present::format_score(&score));
        }
    }

    tracing::info!(
        completed,
        skipped,
        still_active = engine.active_runs(),
        "Replay finished"
    );

    Ok(())
}
