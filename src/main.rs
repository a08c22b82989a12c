//! linode-ddns - keep a Linode DNS record pointed at your WAN address.

use clap::{Parser, Subcommand};
use linode_ddns::config::Config;
use linode_ddns::detector::IpDetector;
use linode_ddns::engine::{CheckResult, PollEngine, StatusSnapshot};
use linode_ddns::providers::LinodeProvider;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linode-ddns")]
#[command(about = "Keep a Linode DNS record pointed at your WAN address")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current WAN address and configured record
    Status,

    /// Resolve the WAN address and push the record once
    Update,

    /// Run the poll loop until interrupted
    Run {
        /// Override the configured check interval, in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Validate the configuration file
    Validate,
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    // Default locations
    let candidates = [
        dirs::config_dir().map(|p| p.join("linode-ddns/config.toml")),
        Some(PathBuf::from("/etc/linode-ddns/config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    // Return default even if it doesn't exist; it will be seeded.
    dirs::config_dir()
        .map(|p| p.join("linode-ddns/config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = get_config_path(cli.config);
    let config = Config::load_or_seed(&config_path)?;

    match cli.command {
        Commands::Status => {
            cmd_status(config).await?;
        }
        Commands::Update => {
            config.validate()?;
            cmd_update(config).await?;
        }
        Commands::Run { interval } => {
            config.validate()?;
            cmd_run(config, interval).await?;
        }
        Commands::Validate => {
            cmd_validate(config)?;
        }
    }

    Ok(())
}

async fn cmd_status(config: Config) -> anyhow::Result<()> {
    let detector = IpDetector::new();

    println!("linode-ddns Status");
    println!("==================\n");

    println!("Record: {}", config.dns.fqdn);

    match detector.lookup().await {
        Ok(ip) => println!("Current WAN address: {}", ip),
        Err(e) => println!("Failed to detect WAN address: {}", e),
    }

    Ok(())
}

async fn cmd_update(config: Config) -> anyhow::Result<()> {
    let fqdn = config.dns.fqdn.clone();
    let detector = IpDetector::new();
    let provider = LinodeProvider::new(&config);

    let (mut engine, _status_rx, _handle) = PollEngine::new(
        Box::new(detector),
        Box::new(provider),
        config.check_interval(),
    );

    print!("Updating {}... ", fqdn);
    match engine.check_once().await {
        CheckResult::Updated(ip) => println!("OK ({})", ip),
        CheckResult::Unchanged(ip) => println!("skipped ({} unchanged)", ip),
        CheckResult::Failed(ip) => {
            println!("FAILED (provider rejected {})", ip);
            std::process::exit(1);
        }
        CheckResult::Down => {
            println!("FAILED (WAN address unavailable)");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn cmd_run(config: Config, interval_override: Option<u64>) -> anyhow::Result<()> {
    let interval = interval_override
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.check_interval());
    let fqdn = config.dns.fqdn.clone();

    let detector = IpDetector::new();
    let provider = LinodeProvider::new(&config);
    let (engine, mut status_rx, recheck) =
        PollEngine::new(Box::new(detector), Box::new(provider), interval);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_task = tokio::spawn(engine.run(shutdown_rx));

    // SIGHUP skips the rest of the current sleep.
    #[cfg(unix)]
    {
        let recheck = recheck.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            let Ok(mut hangup) = signal(SignalKind::hangup()) else {
                return;
            };
            while hangup.recv().await.is_some() {
                recheck.recheck();
            }
        });
    }
    #[cfg(not(unix))]
    let _ = recheck;

    println!(
        "Watching {} every {}s (ctrl-c to stop)",
        fqdn,
        interval.as_secs()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *status_rx.borrow();
                print_snapshot(&fqdn, snapshot);
            }
        }
    }

    let _ = shutdown_tx.send(());
    engine_task.await?;

    Ok(())
}

fn print_snapshot(fqdn: &str, snapshot: StatusSnapshot) {
    let checked = snapshot
        .last_checked_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    match snapshot.result {
        Some(CheckResult::Down) => {
            println!("[{}] {}: WAN address unavailable", checked, fqdn);
        }
        Some(CheckResult::Unchanged(ip)) => {
            println!("[{}] {}: unchanged ({})", checked, fqdn, ip);
        }
        Some(CheckResult::Updated(ip)) => {
            println!("[{}] {}: updated -> {}", checked, fqdn, ip);
        }
        Some(CheckResult::Failed(ip)) => {
            println!("[{}] {}: update to {} failed", checked, fqdn, ip);
        }
        None => {}
    }
}

fn cmd_validate(config: Config) -> anyhow::Result<()> {
    println!("Validating configuration...\n");

    println!("  Record: {}", config.dns.fqdn);
    println!("  API version: {}", config.linode.api_version);
    println!("  Check interval: {}s", config.check_interval_secs);

    match config.validate() {
        Ok(()) => println!("\nConfiguration OK."),
        Err(e) => {
            println!("\nConfiguration invalid: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
