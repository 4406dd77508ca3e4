//! Operation names accepted under `/v1/`.

use super::error::GatewayError;
use cl_02_rate_limiter::Operation;
use std::fmt;
use std::str::FromStr;

/// Remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Mint or return the caller's open pairing code.
    IssuePairingCode,
    /// Dry-run a connect through a code.
    ValidatePairingCode,
    /// Link the caller to a code's owner.
    ConnectToPartner,
    /// Unlink the caller.
    DisconnectPartner,
    /// Remove the caller's account.
    DeleteAccount,
    /// Re-verify the caller's purchase.
    SyncSubscription,
    /// Clear the unseen-connection flag.
    AcknowledgeConnection,
    /// Read the caller's pairing state.
    GetPairingStatus,
    /// Operator: list orphaned entitlements.
    DiagnoseOrphans,
    /// Operator: repair orphaned entitlements.
    CleanupOrphans,
    /// Operator: delete stale rate limit windows.
    SweepRateLimits,
}

impl ApiOperation {
    /// Every operation.
    pub const ALL: [ApiOperation; 11] = [
        Self::IssuePairingCode,
        Self::ValidatePairingCode,
        Self::ConnectToPartner,
        Self::DisconnectPartner,
        Self::DeleteAccount,
        Self::SyncSubscription,
        Self::AcknowledgeConnection,
        Self::GetPairingStatus,
        Self::DiagnoseOrphans,
        Self::CleanupOrphans,
        Self::SweepRateLimits,
    ];

    /// Wire name, the last path segment.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssuePairingCode => "issuePairingCode",
            Self::ValidatePairingCode => "validatePairingCode",
            Self::ConnectToPartner => "connectToPartner",
            Self::DisconnectPartner => "disconnectPartner",
            Self::DeleteAccount => "deleteAccount",
            Self::SyncSubscription => "syncSubscription",
            Self::AcknowledgeConnection => "acknowledgeConnection",
            Self::GetPairingStatus => "getPairingStatus",
            Self::DiagnoseOrphans => "diagnoseOrphans",
            Self::CleanupOrphans => "cleanupOrphans",
            Self::SweepRateLimits => "sweepRateLimits",
        }
    }

    /// Operator calls authorize with the admin secret instead of a token.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::DiagnoseOrphans | Self::CleanupOrphans | Self::SweepRateLimits
        )
    }

    /// Rate limiter gate, if any.
    #[must_use]
    pub fn rate_limited_as(&self) -> Option<Operation> {
        match self {
            Self::IssuePairingCode => Some(Operation::IssueCode),
            Self::ValidatePairingCode => Some(Operation::ValidateCode),
            Self::ConnectToPartner => Some(Operation::Connect),
            Self::DisconnectPartner => Some(Operation::Disconnect),
            Self::DeleteAccount => Some(Operation::DeleteAccount),
            Self::SyncSubscription => Some(Operation::SyncSubscription),
            _ => None,
        }
    }
}

impl FromStr for ApiOperation {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| GatewayError::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
