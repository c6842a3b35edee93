//! rampd — the autoscaling simulation daemon.
//!
//! Single binary that assembles the subsystems:
//! - Container runtime adapter (docker CLI, or in-memory under --dry-run)
//! - Control loop (demand generator, planner, reconciler, state machine)
//! - Console dashboard observer
//!
//! # Usage
//!
//! ```text
//! rampd run --image test-app:latest
//! rampd run --dry-run --alert-pause 5
//! ```
//!
//! Exit codes: 0 after a completed scenario or a drained interrupt,
//! 1 when startup preconditions fail (missing image, bad config).

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};

use ramp_dashboard::ConsoleDashboard;
use ramp_runtime::{ContainerRuntime, DockerRuntime, MemoryRuntime};
use ramp_scale::Simulation;
use ramp_state::ScalingConfig;

#[derive(Parser)]
#[command(name = "rampd", about = "Demand-ramp autoscaling simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scaling scenario: ramp up, alert, ramp down, drain.
    Run {
        /// Scaling group name; containers carry it as the `app` label.
        #[arg(long, default_value = "test-app")]
        app_name: String,

        /// Workload container image.
        #[arg(long, default_value = "test-app:latest")]
        image: String,

        /// Users one replica can serve.
        #[arg(long, default_value = "500")]
        users_per_replica: u32,

        /// Minimum replica count.
        #[arg(long, default_value = "1")]
        min_replicas: u32,

        /// Maximum replica count.
        #[arg(long, default_value = "4")]
        max_replicas: u32,

        /// Demand ceiling: the ramp tops out and the alert fires here.
        #[arg(long, default_value = "2000")]
        ceiling: u32,

        /// Demand floor: the descending ramp stops the run here.
        #[arg(long, default_value = "400")]
        floor: u32,

        /// Demand change per tick.
        #[arg(long, default_value = "100")]
        increment: u32,

        /// Alert pause duration in seconds.
        #[arg(long, default_value = "30")]
        alert_pause: u64,

        /// Tick interval in seconds.
        #[arg(long, default_value = "1")]
        tick_interval: u64,

        /// Docker binary to drive.
        #[arg(long, default_value = "docker")]
        docker_bin: String,

        /// Run against the in-memory runtime instead of Docker.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rampd=debug,ramp=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            app_name,
            image,
            users_per_replica,
            min_replicas,
            max_replicas,
            ceiling,
            floor,
            increment,
            alert_pause,
            tick_interval,
            docker_bin,
            dry_run,
        } => {
            let config = ScalingConfig {
                app_name,
                image,
                per_replica_capacity: users_per_replica,
                min_replicas,
                max_replicas,
                demand_ceiling: ceiling,
                demand_floor: floor,
                demand_increment: increment,
                alert_pause: Duration::from_secs(alert_pause),
                tick_interval: Duration::from_secs(tick_interval),
                ..ScalingConfig::default()
            };
            run_simulation(config, docker_bin, dry_run).await
        }
    }
}

async fn run_simulation(
    config: ScalingConfig,
    docker_bin: String,
    dry_run: bool,
) -> anyhow::Result<()> {
    config.validate()?;
    info!(app = %config.app_name, dry_run, "rampd starting");

    // ── Runtime adapter ────────────────────────────────────────
    let runtime: Arc<dyn ContainerRuntime> = if dry_run {
        info!("dry run: using in-memory runtime");
        Arc::new(MemoryRuntime::new())
    } else {
        Arc::new(DockerRuntime::with_binary(docker_bin))
    };

    // ── Startup preconditions ──────────────────────────────────
    match runtime.image_exists(&config.image).await {
        Ok(true) => info!(image = %config.image, "workload image found"),
        Ok(false) => {
            error!(image = %config.image, "workload image not found; build it first");
            anyhow::bail!("image {} not found", config.image);
        }
        Err(e) => {
            error!(error = %e, "container runtime unreachable");
            return Err(e.into());
        }
    }

    let dashboard = Arc::new(ConsoleDashboard::new(config.clone()));
    dashboard.banner();

    // Reset to a clean slate before the first tick.
    let mut simulation = Simulation::new(config.clone(), runtime, dashboard);
    let removed = simulation.drain().await;
    if removed > 0 {
        info!(removed, "startup drain removed leftover instances");
    }

    if !dry_run {
        info!("simulation starting in 3 seconds");
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    // ── Shutdown signal ────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // ── Control loop ───────────────────────────────────────────
    simulation.run(shutdown_rx).await?;

    info!("rampd stopped");
    Ok(())
}
