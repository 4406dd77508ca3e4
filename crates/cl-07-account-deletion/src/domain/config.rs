//! Deletion configuration.

use std::str::FromStr;

/// How secondary cleanup failures are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionMode {
    /// Any cleanup failure aborts the deletion; the account stays and the
    /// call can be retried.
    #[default]
    Strict,
    /// Failures in the reference and code scans are logged and the deletion
    /// proceeds.
    BestEffort,
}

impl FromStr for DeletionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "best-effort" => Ok(Self::BestEffort),
            other => Err(format!("unknown deletion mode: {other}")),
        }
    }
}

/// Deletion coordinator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionConfig {
    /// Failure handling for the secondary scans.
    pub mode: DeletionMode,
}
