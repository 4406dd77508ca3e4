//! Guarded operations and their default policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `(max_calls, window_minutes)` for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Calls allowed per window.
    pub max_calls: u32,
    /// Window length in minutes. Zero is treated as one.
    pub window_minutes: u32,
}

impl RateLimitPolicy {
    /// Build a policy.
    #[must_use]
    pub const fn new(max_calls: u32, window_minutes: u32) -> Self {
        Self {
            max_calls,
            window_minutes,
        }
    }
}

/// Operations protected by the rate guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// `issuePairingCode`.
    IssueCode,
    /// `validatePairingCode`.
    ValidateCode,
    /// `connectToPartner`.
    Connect,
    /// `disconnectPartner`.
    Disconnect,
    /// `deleteAccount`.
    DeleteAccount,
    /// `syncSubscription`.
    SyncSubscription,
}

impl Operation {
    /// Every guarded operation.
    pub const ALL: [Operation; 6] = [
        Self::IssueCode,
        Self::ValidateCode,
        Self::Connect,
        Self::Disconnect,
        Self::DeleteAccount,
        Self::SyncSubscription,
    ];

    /// Name used in window ids and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssueCode => "issue-code",
            Self::ValidateCode => "validate-code",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::DeleteAccount => "delete-account",
            Self::SyncSubscription => "sync-subscription",
        }
    }

    /// Built-in policy.
    #[must_use]
    pub fn default_policy(&self) -> RateLimitPolicy {
        match self {
            Self::IssueCode => RateLimitPolicy::new(2, 1),
            Self::ValidateCode => RateLimitPolicy::new(10, 1),
            Self::Connect => RateLimitPolicy::new(3, 5),
            Self::Disconnect => RateLimitPolicy::new(3, 5),
            Self::DeleteAccount => RateLimitPolicy::new(3, 60),
            Self::SyncSubscription => RateLimitPolicy::new(10, 5),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown operation: {s}"))
    }
}
