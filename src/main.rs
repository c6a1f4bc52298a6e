//! port-relay - Local TCP relay driven by a descriptor file
//!
//! This binary:
//! - Resolves the upstream port from a descriptor file
//! - Resolves the bind address from the configured policy
//! - Relays every accepted TCP connection to the upstream at that port

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use port_relay::{config, descriptor, netif, BindPolicy, Relay, RelayError, Result};

#[derive(Parser)]
#[command(name = "port-relay")]
#[command(version)]
#[command(about = "Local TCP relay driven by a descriptor file")]
struct Cli {
    /// Path to the descriptor file containing the upstream port
    descriptor: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing descriptor path is a usage hint, not a failure
    let Some(descriptor_path) = cli.descriptor else {
        println!("Missing descriptor file path.");
        println!("Usage: port-relay <DESCRIPTOR> [--config <FILE>] [--verbose]");
        return Ok(());
    };

    // Initialize logging
    // Priority: --verbose flag, then RUST_LOG env var, then default "info"
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };
    tracing_subscriber::fmt().with_env_filter(&log_level).init();

    info!("Starting port-relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match cli.config {
        Some(ref path) => {
            let config = config::load_config(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => config::default_config()?,
    };
    let config = Arc::new(config);

    // Resolve the upstream port from the descriptor
    let port = descriptor::read_port(&descriptor_path)?;
    info!("Resolved port {} from {:?}", port, descriptor_path);

    // Resolve bind and upstream addresses; a missing bridge interface falls
    // back to the wildcard policy
    let selection = match netif::resolve_bind(config.server.bind, &config.server.bridge_interface)
    {
        Ok(selection) => selection,
        Err(e @ RelayError::NoMatchingInterface(_)) => {
            warn!("{}; falling back to wildcard bind", e);
            netif::resolve_bind(BindPolicy::Wildcard, "")?
        }
        Err(e) => return Err(e),
    };

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    let relay = Relay::bind(
        selection.bind_addr,
        port,
        selection.upstream_addr,
        Arc::clone(&config),
        shutdown_rx,
    )
    .await?;

    let stats = relay.stats();

    info!(
        "Relay ready: {}:{} -> {}:{}",
        selection.bind_addr, port, selection.upstream_addr, port
    );

    // Spawn the accept loop
    let mut relay_handle = tokio::spawn(relay.run());

    // Wait for a shutdown signal, or for the listener itself to die
    let listener_finished = tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating shutdown...");
            false
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("Failed to install SIGTERM handler");
                sigterm.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, initiating shutdown...");
            false
        }
        result = &mut relay_handle => {
            // A dead listener is fatal; surface it to the operator
            if let Ok(Err(e)) = result {
                error!("Relay error: {}", e);
                return Err(e);
            }
            true
        }
    };

    // Stop the accept loop and wait for it to finish
    let _ = shutdown_tx.send(());
    if !listener_finished {
        let _ = relay_handle.await;
    }

    info!(
        "Shutdown complete. Total connections handled: {}",
        stats
            .connections_accepted
            .load(std::sync::atomic::Ordering::Relaxed)
    );

    Ok(())
}
