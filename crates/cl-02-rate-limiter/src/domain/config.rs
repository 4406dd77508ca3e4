//! Rate limiter configuration.

use super::operation::{Operation, RateLimitPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// What happens when a caller is over the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnforcementMode {
    /// Deny with `RateLimitError::Exceeded`.
    #[default]
    Enforcing,
    /// Allow, but persist a security event.
    LogOnly,
}

impl FromStr for EnforcementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforcing" | "enforce" => Ok(Self::Enforcing),
            "log-only" | "log_only" | "logonly" => Ok(Self::LogOnly),
            other => Err(format!("unknown rate limit mode: {other}")),
        }
    }
}

/// What happens when the counter store cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Allow the call.
    #[default]
    FailOpen,
    /// Propagate the store error.
    Strict,
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Default)]
pub struct RateLimiterConfig {
    /// Over-limit behaviour.
    pub mode: EnforcementMode,
    /// Store-outage behaviour.
    pub failure_policy: FailurePolicy,
    /// Per-operation policy replacements.
    pub overrides: HashMap<Operation, RateLimitPolicy>,
}

impl RateLimiterConfig {
    /// Effective policy for `operation`.
    #[must_use]
    pub fn policy_for(&self, operation: Operation) -> RateLimitPolicy {
        self.overrides
            .get(&operation)
            .copied()
            .unwrap_or_else(|| operation.default_policy())
    }

    /// Replace the policy for one operation.
    #[must_use]
    pub fn with_policy(mut self, operation: Operation, policy: RateLimitPolicy) -> Self {
        self.overrides.insert(operation, policy);
        self
    }
}
