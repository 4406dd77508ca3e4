//! Gateway configuration.

/// Gateway configuration.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Operator secret for `diagnoseOrphans`, `cleanupOrphans` and
    /// `sweepRateLimits`. Empty means every admin call is refused.
    pub admin_secret: String,
    /// Create the caller's account document on first authenticated call.
    pub auto_provision: bool,
    /// Retention passed to the rate limit sweep.
    pub sweep_retention_hours: i64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            admin_secret: String::new(),
            auto_provision: true,
            sweep_retention_hours: cl_02_rate_limiter::DEFAULT_WINDOW_RETENTION_HOURS,
        }
    }
}

impl GatewayConfig {
    /// Whether an admin secret has been configured.
    #[must_use]
    pub fn admin_enabled(&self) -> bool {
        !self.admin_secret.is_empty()
    }
}
