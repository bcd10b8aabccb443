//! taskgridd — the TaskGrid daemon.
//!
//! Assembles the autoscaler with its collaborators:
//! - Cluster view (workflows, jobs, known instances)
//! - Resource controller sink
//! - Autoscaling policy from a TOML config file
//!
//! # Usage
//!
//! ```text
//! taskgridd run --config /etc/taskgrid/taskgrid.toml --state-file /var/lib/taskgrid/cluster.json
//! ```

mod controller;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use taskgrid_autoscale::{AutoScalingRunnable, AutoscaleConfig};
use taskgrid_state::SnapshotFile;

use crate::controller::LoggingResourceController;

#[derive(Parser)]
#[command(name = "taskgridd", about = "TaskGrid autoscaling daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the autoscaler until interrupted.
    Run {
        /// Autoscaling config (TOML). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON cluster view, re-read on every tick.
        #[arg(long)]
        state_file: PathBuf,
    },

    /// Validate a config file and print the effective policy.
    Check {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Run { config, state_file } => run(config, state_file).await,
        Command::Check { config } => check(config),
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,taskgridd=debug,taskgrid=debug"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AutoscaleConfig> {
    let config = match path {
        Some(path) => {
            let config = AutoscaleConfig::from_file(path)?;
            info!(?path, "autoscaling config loaded");
            config
        }
        None => {
            info!("no config file given, using default autoscaling policy");
            AutoscaleConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

fn check(path: PathBuf) -> anyhow::Result<()> {
    let config = load_config(Some(&path))?;
    info!(
        partitions_per_container = config.partitions_per_container,
        min_containers = config.min_containers,
        max_containers = config.max_containers,
        overprovision_factor = config.overprovision_factor,
        window_size = config.window_size,
        idle_tolerance = %config.idle_tolerance,
        tick_interval = %config.tick_interval,
        "config is valid"
    );
    Ok(())
}

async fn run(config_path: Option<PathBuf>, state_file: PathBuf) -> anyhow::Result<()> {
    info!("TaskGrid daemon starting");

    let config = load_config(config_path.as_ref())?;

    // ── Collaborators ──────────────────────────────────────────

    let cluster = Arc::new(SnapshotFile::new(state_file));
    info!(path = ?cluster.path(), "cluster view configured");

    let controller = Arc::new(LoggingResourceController::new());

    // ── Autoscaler ─────────────────────────────────────────────

    let mut autoscaler =
        AutoScalingRunnable::from_config(&config, cluster.clone(), cluster, controller.clone())?;
    let initial_delay = config.initial_delay()?;
    let interval = config.tick_interval()?;
    info!(
        partitions_per_container = autoscaler.policy().partitions_per_container(),
        overprovision_factor = autoscaler.policy().overprovision_factor(),
        min = autoscaler.policy().min_containers(),
        max = autoscaler.policy().max_containers(),
        window = autoscaler.reservoir().capacity(),
        "autoscaler initialized"
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let autoscale_handle = tokio::spawn(async move {
        autoscaler.run(initial_delay, interval, shutdown_rx).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    // Let an in-flight tick finish.
    autoscale_handle.await?;

    if let Some(last) = controller.last_request() {
        info!(containers = last.target, in_use = last.in_use.len(), "last requested pool size");
    }

    info!("TaskGrid daemon stopped");
    Ok(())
}
