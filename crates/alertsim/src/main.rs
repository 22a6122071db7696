use alertsim_core::{SimConfig, Simulation, StatsSnapshot};
use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "alertsim")]
#[command(about = "Message alert delivery simulator - producer, sender pool, progress monitor")]
struct Args {
    /// Path to a TOML configuration file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Total number of messages to generate (overrides config)
    #[arg(long)]
    message_count: Option<u64>,

    /// Number of concurrent sender workers (overrides config)
    #[arg(long)]
    senders: Option<usize>,

    /// Probability in [0.0, 1.0) that a delivery fails (overrides config)
    #[arg(long)]
    failure_rate: Option<f64>,

    /// Mean simulated delivery latency in milliseconds (overrides config)
    #[arg(long)]
    mean_delay_ms: Option<u64>,

    /// Seconds between progress reports (overrides config)
    #[arg(long)]
    monitor_interval_secs: Option<u64>,

    /// Deterministic seed for reproducible runs (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the final statistics as JSON to this path
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RunResult {
    timestamp: String,
    duration_ms: u64,
    message_count: u64,
    sender_count: usize,
    sent: u64,
    failed: u64,
    total_processing_ms: u64,
    avg_processing_ms: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => SimConfig::default(),
    };
    apply_overrides(&mut config, &args);

    let mut sim = Simulation::new(config).context("Invalid simulation configuration")?;

    info!(
        message_count = sim.config().message_count,
        senders = sim.config().sender_count,
        failure_rate = sim.config().failure_rate,
        mean_delay_ms = sim.config().mean_delay_ms,
        monitor_interval_secs = sim.config().monitor_interval_secs,
        "Starting simulation"
    );

    let start = Instant::now();
    let snapshot = sim.run().await;
    let duration_ms = start.elapsed().as_millis() as u64;

    print_summary(&snapshot, duration_ms);

    if let Some(out) = &args.out {
        let result = RunResult {
            timestamp: chrono::Utc::now().to_rfc3339(),
            duration_ms,
            message_count: sim.config().message_count,
            sender_count: sim.config().sender_count,
            sent: snapshot.sent,
            failed: snapshot.failed,
            total_processing_ms: snapshot.total_processing_ms,
            avg_processing_ms: snapshot.avg_processing_ms,
        };
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(out, json).with_context(|| format!("Failed to write {:?}", out))?;
        info!("Results written to {:?}", out);
    }

    Ok(())
}

fn apply_overrides(config: &mut SimConfig, args: &Args) {
    if let Some(message_count) = args.message_count {
        config.message_count = message_count;
    }
    if let Some(senders) = args.senders {
        config.sender_count = senders;
    }
    if let Some(failure_rate) = args.failure_rate {
        config.failure_rate = failure_rate;
    }
    if let Some(mean_delay_ms) = args.mean_delay_ms {
        config.mean_delay_ms = mean_delay_ms;
    }
    if let Some(monitor_interval_secs) = args.monitor_interval_secs {
        config.monitor_interval_secs = monitor_interval_secs;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
}

fn print_summary(snapshot: &StatsSnapshot, duration_ms: u64) {
    println!("\n=== Final Statistics ===");
    println!("Duration: {}ms", duration_ms);
    println!("Messages sent: {}", snapshot.sent);
    println!("Messages failed: {}", snapshot.failed);
    println!("Total processing time: {}ms", snapshot.total_processing_ms);
    println!(
        "Average processing time: {:.2}ms",
        snapshot.avg_processing_ms
    );
    println!();
}
