//! Pairing code configuration.

use chrono::Duration;
use shared_types::entities::DEFAULT_CODE_TTL_HOURS;

/// Digits per code.
pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Candidates tried before issuance gives up.
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 5;

/// Pairing code configuration.
#[derive(Debug, Clone)]
pub struct PairingCodeConfig {
    /// Lifetime of a freshly issued code.
    pub ttl: Duration,
    /// Digits per code.
    pub code_length: usize,
    /// Candidates tried on collision.
    pub max_generation_attempts: u32,
    /// Pause between colliding candidates.
    pub collision_backoff: Option<std::time::Duration>,
}

impl Default for PairingCodeConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(DEFAULT_CODE_TTL_HOURS),
            code_length: DEFAULT_CODE_LENGTH,
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
            collision_backoff: Some(std::time::Duration::from_millis(50)),
        }
    }
}
