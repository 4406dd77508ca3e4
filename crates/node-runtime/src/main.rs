//! # CoupleLink Node Runtime
//!
//! The main entry point for the CoupleLink pairing backend.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, default `info`)
//! 2. Load configuration (defaults, then `CL_*` environment)
//! 3. Validate the admin secret unless `CL_DEV_MODE` is set
//! 4. Initialize subsystems in dependency order (Level 0 → Level 4)
//! 5. Start background tasks (window sweep, orphan cleanup)
//! 6. Serve the gateway until Ctrl+C
//!
//! ## Request Flow
//!
//! ```text
//! POST /v1/<op> ──→ cl-08 gateway ──→ cl-02 rate gate ──→ cl-03..cl-07 ──→ cl-01 store tx
//!                                                                │
//!                                                     commit ────┴──→ shared-bus PartnerEvent
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shared_bus::EventPublisher;

use node_runtime::tasks::{spawn_orphan_cleanup, spawn_rate_limit_sweep};
use node_runtime::{NodeConfig, SubsystemContainer};

/// The runtime orchestrating all subsystems.
pub struct NodeRuntime {
    /// Subsystem container with all initialized services.
    container: Arc<SubsystemContainer>,
    /// Background task handles.
    tasks: Vec<JoinHandle<()>>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    /// Create a new runtime with configuration.
    pub fn new(config: NodeConfig) -> Self {
        info!("Creating CoupleLink node runtime");
        let container = Arc::new(SubsystemContainer::new(config));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            container,
            tasks: Vec::new(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Start background tasks.
    pub fn start(&mut self) {
        info!("===========================================");
        info!("  CoupleLink Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let schedule = self.container.config.schedule.clone();
        let retention =
            chrono::Duration::hours(self.container.config.gateway.sweep_retention_hours);

        match schedule.sweep_interval {
            Some(period) => {
                self.tasks.push(spawn_rate_limit_sweep(
                    Arc::clone(&self.container.subsystems.limiter),
                    period,
                    retention,
                    self.shutdown_rx.clone(),
                ));
                info!(period_secs = period.as_secs(), "[cl-02] Window sweep scheduled");
            }
            None => warn!("[cl-02] Window sweep disabled, rate limit documents will accumulate"),
        }

        if let Some(period) = schedule.orphan_cleanup_interval {
            self.tasks.push(spawn_orphan_cleanup(
                Arc::clone(&self.container.subsystems.auditor),
                period,
                self.shutdown_rx.clone(),
            ));
            info!(period_secs = period.as_secs(), "[cl-06] Orphan cleanup scheduled");
        }
    }

    /// Serve the gateway until `ctrl_c`.
    pub async fn serve(&self) -> Result<()> {
        let address = self.container.config.bind_address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {address}"))?;

        let mut shutdown = self.shutdown_rx.clone();
        let signal = async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!("Failed to listen for Ctrl+C: {}", e);
                    }
                }
                _ = shutdown.changed() => {}
            }
            info!("Shutdown signal received, draining connections");
        };

        cl_08_api_gateway::serve(listener, Arc::clone(&self.container.gateway), signal)
            .await
            .context("Gateway server failed")
    }

    /// Shutdown the runtime gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Signal shutdown to all background tasks
    /// 2. Wait for them (with timeout)
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        for task in self.tasks {
            if tokio::time::timeout(Duration::from_secs(2), task)
                .await
                .is_err()
            {
                warn!("Background task did not stop in time");
            }
        }

        info!(
            events_published = self.container.event_bus.events_published(),
            events_unheard = self.container.event_bus.unheard_count(),
            "Shutdown complete"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    // Load configuration
    let config = NodeConfig::from_env().context("Invalid configuration")?;

    if config.dev_mode {
        warn!("CL_DEV_MODE is set, production checks skipped");
    } else {
        config.validate_for_production()?;
    }

    let mut runtime = NodeRuntime::new(config);
    runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    let served = runtime.serve().await;

    runtime.shutdown().await;
    served
}
