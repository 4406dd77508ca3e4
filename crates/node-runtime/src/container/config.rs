//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! ## Environment Overrides
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `CL_HTTP_PORT` | gateway listening port |
//! | `CL_ADMIN_SECRET` | operator secret for the admin operations |
//! | `CL_RATE_LIMIT_MODE` | `enforcing` or `log-only` |
//! | `CL_RATE_LIMIT_STRICT` | `true` propagates counter store failures |
//! | `CL_CODE_TTL_SECS` | pairing code lifetime |
//! | `CL_SWEEP_INTERVAL_SECS` | rate limit window sweep period, `0` disables |
//! | `CL_ORPHAN_CLEANUP_INTERVAL_SECS` | scheduled orphan cleanup period, `0` disables |
//! | `CL_DELETION_BEST_EFFORT` | `true` lets deletion skip failed secondary scans |
//! | `CL_IDENTITY_TOKENS` | `token=account[:name]` list for the token table |
//! | `CL_ENTITLED_ACCOUNTS` | accounts whose purchase verifies as valid |
//! | `CL_DEV_MODE` | `true` skips the production checks |
//!
//! ## Security Requirements
//!
//! - `admin_secret` MUST NOT be empty or a known placeholder in production

use cl_01_document_store::StoreConfig;
use cl_02_rate_limiter::{EnforcementMode, FailurePolicy, RateLimiterConfig};
use cl_03_pairing_codes::PairingCodeConfig;
use cl_05_connection_engine::ConnectionConfig;
use cl_07_account_deletion::{DeletionConfig, DeletionMode};
use cl_08_api_gateway::GatewayConfig;
use std::time::Duration;
use thiserror::Error;

/// Admin secrets that count as unset.
const PLACEHOLDER_SECRETS: [&str; 3] = ["changeme", "secret", "admin"];

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// HTTP configuration.
    pub http: HttpConfig,
    /// Document store retry policy.
    pub store: StoreConfig,
    /// Rate limiter.
    pub rate_limit: RateLimiterConfig,
    /// Pairing codes.
    pub pairing: PairingCodeConfig,
    /// Connection engine.
    pub connection: ConnectionConfig,
    /// Account deletion.
    pub deletion: DeletionConfig,
    /// Gateway, including the admin secret.
    pub gateway: GatewayConfig,
    /// Background task periods.
    pub schedule: ScheduleConfig,
    /// In-process identity and entitlement fixtures.
    pub seed: SeedConfig,
    /// Skip production checks.
    pub dev_mode: bool,
}

/// HTTP configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Bind address.
    pub host: String,
    /// Listening port.
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Background task periods. `None` disables a task.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Rate limit window sweep.
    pub sweep_interval: Option<Duration>,
    /// Orphan cleanup.
    pub orphan_cleanup_interval: Option<Duration>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Some(Duration::from_secs(60 * 60)),
            orphan_cleanup_interval: None,
        }
    }
}

/// Accounts and tokens loaded into the in-process adapters.
#[derive(Debug, Clone, Default)]
pub struct SeedConfig {
    /// `token=account[:name]` entries.
    pub identity_tokens: String,
    /// Accounts the entitlement verifier accepts.
    pub entitled_accounts: Vec<String>,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Admin secret is empty or a placeholder.
    #[error(
        "SECURITY VIOLATION: admin secret is unset or a placeholder. \
         Set CL_ADMIN_SECRET or run with CL_DEV_MODE=true."
    )]
    InsecureAdminSecret,

    /// An environment variable could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },
}

impl NodeConfig {
    /// Defaults overridden by `CL_*` variables of the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(port) = get("CL_HTTP_PORT") {
            self.http.port = parse("CL_HTTP_PORT", &port)?;
        }
        if let Some(secret) = get("CL_ADMIN_SECRET") {
            self.gateway.admin_secret = secret;
        }
        if let Some(mode) = get("CL_RATE_LIMIT_MODE") {
            self.rate_limit.mode =
                mode.parse::<EnforcementMode>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "CL_RATE_LIMIT_MODE",
                        value: mode.clone(),
                    })?;
        }
        if let Some(strict) = get("CL_RATE_LIMIT_STRICT") {
            self.rate_limit.failure_policy = if parse_flag("CL_RATE_LIMIT_STRICT", &strict)? {
                FailurePolicy::Strict
            } else {
                FailurePolicy::FailOpen
            };
        }
        if let Some(ttl) = get("CL_CODE_TTL_SECS") {
            let secs: i64 = parse("CL_CODE_TTL_SECS", &ttl)?;
            if secs <= 0 {
                return Err(ConfigError::InvalidValue {
                    key: "CL_CODE_TTL_SECS",
                    value: ttl,
                });
            }
            self.pairing.ttl = chrono::Duration::seconds(secs);
        }
        if let Some(secs) = get("CL_SWEEP_INTERVAL_SECS") {
            self.schedule.sweep_interval = interval(parse("CL_SWEEP_INTERVAL_SECS", &secs)?);
        }
        if let Some(secs) = get("CL_ORPHAN_CLEANUP_INTERVAL_SECS") {
            self.schedule.orphan_cleanup_interval =
                interval(parse("CL_ORPHAN_CLEANUP_INTERVAL_SECS", &secs)?);
        }
        if let Some(best_effort) = get("CL_DELETION_BEST_EFFORT") {
            self.deletion.mode = if parse_flag("CL_DELETION_BEST_EFFORT", &best_effort)? {
                DeletionMode::BestEffort
            } else {
                DeletionMode::Strict
            };
        }
        if let Some(tokens) = get("CL_IDENTITY_TOKENS") {
            self.seed.identity_tokens = tokens;
        }
        if let Some(accounts) = get("CL_ENTITLED_ACCOUNTS") {
            self.seed.entitled_accounts = accounts
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(dev) = get("CL_DEV_MODE") {
            self.dev_mode = parse_flag("CL_DEV_MODE", &dev)?;
        }
        Ok(self)
    }

    /// Validate configuration for production readiness.
    ///
    /// # Returns
    ///
    /// Returns `Err` if the admin secret is empty or a known placeholder.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        let secret = self.gateway.admin_secret.as_str();
        if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret.to_ascii_lowercase().as_str())
        {
            return Err(ConfigError::InsecureAdminSecret);
        }
        Ok(())
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

fn interval(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
