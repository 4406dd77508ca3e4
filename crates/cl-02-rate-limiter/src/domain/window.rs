//! Window bucket arithmetic and decisions.

use chrono::{DateTime, Utc};

/// Hours a window document is kept after its last call.
pub const DEFAULT_WINDOW_RETENTION_HOURS: i64 = 24;

fn window_secs(window_minutes: u32) -> i64 {
    i64::from(window_minutes.max(1)) * 60
}

/// `floor(unix_minutes / window_minutes)`.
#[must_use]
pub fn window_bucket(now: DateTime<Utc>, window_minutes: u32) -> i64 {
    now.timestamp().div_euclid(window_secs(window_minutes))
}

/// Seconds until the bucket containing `now` ends. Always at least 1.
#[must_use]
pub fn retry_after_secs(now: DateTime<Utc>, window_minutes: u32) -> u64 {
    let span = window_secs(window_minutes);
    let next = (window_bucket(now, window_minutes) + 1) * span;
    u64::try_from(next - now.timestamp()).unwrap_or(1).max(1)
}

/// Outcome of one guarded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Within the limit.
    Allowed {
        /// Calls left in this window.
        remaining: u32,
    },
    /// Over the limit in log-only mode; allowed and recorded.
    Flagged {
        /// Calls seen in this window, including this one.
        observed: u32,
    },
    /// Over the limit while enforcing.
    Denied {
        /// Seconds until the next window opens.
        retry_after_secs: u64,
    },
    /// The counter store failed and the policy is fail-open.
    Unchecked,
}

impl RateDecision {
    /// Whether the call may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied { .. })
    }
}
