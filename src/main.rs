use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guardpost::blocking::{BlockingDecisionEngine, LedgerCapGuard, WeightedThresholdPolicy};
use guardpost::config::GuardpostConfig;
use guardpost::credential::Pbkdf2Sha256Verifier;
use guardpost::credit::CreditLimiter;
use guardpost::grpc::{GrpcAttemptForwarder, GrpcServer};
use guardpost::sharding::{RemoteHost, ResponsibilitySet};
use guardpost::store::MemoryStableStore;
use guardpost::tracking::MultiperiodFrequencyTracker;

/// Distributed login-attempt blocking service.
#[derive(Parser, Debug)]
#[command(name = "guardpost", version, about)]
struct Cli {
    /// Path to a YAML or JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured gRPC listen address
    #[arg(long)]
    listen_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting Guardpost Login Blocking Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => GuardpostConfig::from_file(path)?,
        None => GuardpostConfig::default(),
    };
    if let Some(addr) = cli.listen_addr {
        config.server.grpc_addr = addr;
    }
    config.validate()?;
    info!(grpc_addr = %config.server.grpc_addr, "Configuration loaded");

    // Responsibility assignment over the configured fleet
    let responsibility = Arc::new(ResponsibilitySet::new());
    for member in &config.cluster.members {
        responsibility.add(&member.key, RemoteHost::from(member));
    }
    let local_host = config
        .cluster
        .members
        .iter()
        .find(|m| m.key == config.cluster.self_key)
        .map(RemoteHost::from)
        .expect("validated config contains the local host");
    info!(
        self_key = %local_host.key,
        members = config.cluster.members.len(),
        "Responsibility set initialized"
    );

    // Signal trackers and budgets
    let popularity = Arc::new(MultiperiodFrequencyTracker::new(
        config.popularity.number_of_periods,
        config.popularity.shortest_window,
        config.popularity.growth_factor,
    ));
    let credit = Arc::new(CreditLimiter::from_config(&config.credit));
    let memory_guard = Arc::new(LedgerCapGuard::new(
        Arc::clone(&credit),
        config.server.max_resident_ledgers,
    ));

    // Periodically reclaim drained ledgers.
    let pruned = Arc::clone(&credit);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            pruned.prune();
        }
    });

    let default_deadline = Duration::from_millis(config.server.default_deadline_ms);
    let engine = Arc::new(BlockingDecisionEngine::new(
        local_host,
        responsibility,
        popularity,
        credit,
        Arc::new(MemoryStableStore::new()),
        Arc::new(Pbkdf2Sha256Verifier::default()),
        Arc::new(WeightedThresholdPolicy::from_config(&config.blocking)),
        memory_guard,
        Arc::new(GrpcAttemptForwarder::new(default_deadline)),
    ));
    info!("Blocking decision engine initialized");

    let grpc_server = GrpcServer::new(config.server.grpc_addr, engine, default_deadline);

    info!("Starting gRPC server on {}", config.server.grpc_addr);

    // Run the server with graceful shutdown on Ctrl+C
    grpc_server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Guardpost Login Blocking Service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
