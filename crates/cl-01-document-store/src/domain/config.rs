//! Transaction retry policy.

use std::time::Duration;

/// Default number of attempts before a transaction gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Attempts per transaction, including the first.
    pub max_attempts: u32,
    /// Fixed pause between conflicting attempts.
    pub backoff: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: None,
        }
    }
}

impl StoreConfig {
    /// Same policy with a fixed backoff.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = Some(backoff);
        self
    }
}
