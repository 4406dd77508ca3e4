//! # Rate Limiter Service
//!
//! Atomic check-and-increment on `RateLimitWindow` documents, plus the
//! retention sweep.

use crate::domain::{
    retry_after_secs, window_bucket, EnforcementMode, FailurePolicy, Operation, RateDecision,
    RateLimitError, RateLimiterConfig,
};
use chrono::Duration;
use cl_01_document_store::{Store, StoreError};
use shared_types::entities::{
    AccountId, RateLimitWindow, SecurityEvent, SecurityEventKind,
};
use shared_types::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Retry hint when a window could not be counted under contention.
const CONTENTION_RETRY_SECS: u64 = 1;

/// Documents deleted per sweep transaction.
const SWEEP_BATCH: usize = 100;

enum Counted {
    Within { count: u32 },
    Over { count: u32 },
    Flagged { count: u32 },
}

/// Per-account, per-operation call guard.
pub struct RateLimiter {
    store: Store,
    clock: Arc<dyn Clock>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Create a limiter. Mode and failure policy are fixed for its lifetime.
    pub fn new(store: Store, clock: Arc<dyn Clock>, config: RateLimiterConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Count one call and decide whether it may proceed.
    ///
    /// Only an unreachable store follows the configured `FailurePolicy`.
    /// Contention is denied; any other store error is returned.
    pub async fn check_and_increment(
        &self,
        account: &AccountId,
        operation: Operation,
    ) -> Result<RateDecision, RateLimitError> {
        let policy = self.config.policy_for(operation);
        let mode = self.config.mode;
        let now = self.clock.now();
        let bucket = window_bucket(now, policy.window_minutes);
        let window_id = RateLimitWindow::window_id(account, operation.as_str(), bucket);

        let counted = self
            .store
            .run_transaction(|tx| {
                let mut window = tx.get::<RateLimitWindow>(&window_id)?.unwrap_or_else(|| {
                    RateLimitWindow::open(
                        account.clone(),
                        operation.as_str(),
                        bucket,
                        policy.window_minutes,
                        now,
                    )
                });

                if window.count < policy.max_calls {
                    window.record_call(now);
                    tx.set(&window)?;
                    return Ok::<_, StoreError>(Counted::Within {
                        count: window.count,
                    });
                }

                match mode {
                    EnforcementMode::Enforcing => Ok(Counted::Over {
                        count: window.count,
                    }),
                    EnforcementMode::LogOnly => {
                        window.record_call(now);
                        tx.set(&window)?;
                        tx.create(&SecurityEvent {
                            id: Uuid::new_v4(),
                            account_id: account.clone(),
                            operation: operation.as_str().to_string(),
                            kind: SecurityEventKind::RateLimitExceeded,
                            observed_count: window.count,
                            limit: policy.max_calls,
                            recorded_at: now,
                        })?;
                        Ok(Counted::Flagged {
                            count: window.count,
                        })
                    }
                }
            })
            .await;

        match counted {
            Ok(Counted::Within { count }) => {
                debug!(account = %account, operation = %operation, count, "Call allowed");
                Ok(RateDecision::Allowed {
                    remaining: policy.max_calls.saturating_sub(count),
                })
            }
            Ok(Counted::Over { count }) => {
                let retry_after_secs = retry_after_secs(now, policy.window_minutes);
                warn!(
                    account = %account,
                    operation = %operation,
                    count,
                    limit = policy.max_calls,
                    retry_after_secs,
                    "Rate limit exceeded"
                );
                Ok(RateDecision::Denied { retry_after_secs })
            }
            Ok(Counted::Flagged { count }) => {
                warn!(
                    account = %account,
                    operation = %operation,
                    count,
                    limit = policy.max_calls,
                    "Rate limit exceeded (log-only), security event recorded"
                );
                Ok(RateDecision::Flagged { observed: count })
            }
            // A window too hot to commit is the abuse case; it never fails open.
            Err(StoreError::Contention { attempts }) => {
                warn!(
                    account = %account,
                    operation = %operation,
                    attempts,
                    "Rate limit window contended, denying call"
                );
                Ok(RateDecision::Denied {
                    retry_after_secs: CONTENTION_RETRY_SECS,
                })
            }
            Err(StoreError::Unavailable) => match self.config.failure_policy {
                FailurePolicy::FailOpen => {
                    warn!(
                        account = %account,
                        operation = %operation,
                        "Rate limit store unavailable, allowing call"
                    );
                    Ok(RateDecision::Unchecked)
                }
                FailurePolicy::Strict => Err(RateLimitError::Store(StoreError::Unavailable)),
            },
            Err(e) => Err(RateLimitError::Store(e)),
        }
    }

    /// `check_and_increment`, with a denial turned into an error.
    pub async fn enforce(
        &self,
        account: &AccountId,
        operation: Operation,
    ) -> Result<(), RateLimitError> {
        match self.check_and_increment(account, operation).await? {
            RateDecision::Denied { retry_after_secs } => Err(RateLimitError::Exceeded {
                operation,
                retry_after_secs,
            }),
            _ => Ok(()),
        }
    }

    /// Delete windows whose last call is older than `retention`.
    ///
    /// Runs outside the request path. Each batch re-reads its documents in a
    /// transaction, so a window touched meanwhile is kept.
    pub async fn sweep_expired(&self, retention: Duration) -> Result<usize, RateLimitError> {
        let cutoff = self.clock.now() - retention;
        let stale: Vec<String> = self
            .store
            .scan::<RateLimitWindow>()?
            .into_iter()
            .filter(|w| w.last_call_at < cutoff)
            .map(|w| w.id())
            .collect();

        let mut removed = 0usize;
        for batch in stale.chunks(SWEEP_BATCH) {
            removed += self
                .store
                .run_transaction(|tx| {
                    let mut deleted = 0usize;
                    for id in batch {
                        if let Some(window) = tx.get::<RateLimitWindow>(id)? {
                            if window.last_call_at < cutoff {
                                tx.delete::<RateLimitWindow>(id);
                                deleted += 1;
                            }
                        }
                    }
                    Ok::<_, StoreError>(deleted)
                })
                .await?;
        }

        if removed > 0 {
            info!(removed, "Swept expired rate limit windows");
        }
        Ok(removed)
    }
}
