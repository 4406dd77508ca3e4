//! # Background Tasks
//!
//! Periodic maintenance that runs outside the request path:
//!
//! - rate limit window sweep (windows idle longer than the retention)
//! - scheduled orphan cleanup (optional)
//!
//! Each task runs until the shutdown watch flips to `true`.

use cl_02_rate_limiter::RateLimiter;
use cl_06_orphan_auditor::OrphanAuditor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Start the rate limit window sweep.
pub fn spawn_rate_limit_sweep(
    limiter: Arc<RateLimiter>,
    period: Duration,
    retention: chrono::Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match limiter.sweep_expired(retention).await {
                        Ok(removed) => debug!(removed, "[cl-02] Sweep finished"),
                        Err(e) => error!(error = %e, "[cl-02] Rate limit sweep failed"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("[cl-02] Shutdown signal received");
                    break;
                }
            }
        }
    })
}

/// Start the scheduled orphan cleanup.
pub fn spawn_orphan_cleanup(
    auditor: Arc<OrphanAuditor>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match auditor.cleanup().await {
                        Ok(report) => debug!(
                            checked = report.checked_count,
                            cleaned = report.cleaned_count,
                            "[cl-06] Scheduled cleanup finished"
                        ),
                        Err(e) => error!(error = %e, "[cl-06] Scheduled orphan cleanup failed"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("[cl-06] Shutdown signal received");
                    break;
                }
            }
        }
    })
}
