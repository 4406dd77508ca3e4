//! Request and response bodies.
//!
//! Caller identity never appears in a request body; it comes from the bearer
//! token. Operations whose subsystem result already has the wire shape
//! (`IssuedCode`, `ConnectOutcome`, `PairingStatus`, `SyncOutcome`, the
//! orphan reports) return it unchanged.

use cl_03_pairing_codes::{PairingError, ValidatedCode};
use serde::{Deserialize, Serialize};
use shared_types::entities::AccountId;
use shared_types::ClassifiedError;

/// Body of `validatePairingCode` and `connectToPartner`.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeRequest {
    /// Token as typed by the user.
    pub code: String,
}

/// Body of `syncSubscription`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Store receipt handed to the entitlement verifier.
    #[serde(default)]
    pub receipt: Option<String>,
}

/// Body of every operator call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRequest {
    /// Operator secret.
    #[serde(default)]
    pub admin_secret: String,
}

/// Result of `validatePairingCode`.
///
/// Rejections are reported in-band so the client can branch on `reason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Whether a connect through this code would currently pass validation.
    pub valid: bool,
    /// Owner's display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    /// Owner's account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<AccountId>,
    /// Rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl From<ValidatedCode> for ValidateResponse {
    fn from(validated: ValidatedCode) -> Self {
        Self {
            valid: true,
            owner_name: validated.owner_name,
            owner_id: Some(validated.owner_id),
            reason: None,
        }
    }
}

impl ValidateResponse {
    /// In-band rejection.
    #[must_use]
    pub fn rejected(rejection: &PairingError) -> Self {
        Self {
            valid: false,
            owner_name: None,
            owner_id: None,
            reason: Some(rejection.reason()),
        }
    }
}

/// Acknowledgement with no further data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OkResponse {
    /// Always true.
    pub ok: bool,
}

impl OkResponse {
    /// `{ "ok": true }`.
    pub const OK: Self = Self { ok: true };
}

/// Result of `disconnectPartner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectResponse {
    /// Always true.
    pub ok: bool,
    /// The account the caller was linked to.
    pub former_partner_id: AccountId,
}

/// Result of `sweepRateLimits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    /// Windows deleted.
    pub removed_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_shape() {
        let json = serde_json::to_value(ValidateResponse::rejected(&PairingError::AlreadyUsed))
            .unwrap();
        assert_eq!(json, serde_json::json!({ "valid": false, "reason": "already-used" }));
    }

    #[test]
    fn test_admin_request_reads_camel_case() {
        let req: AdminRequest =
            serde_json::from_value(serde_json::json!({ "adminSecret": "s3cret" })).unwrap();
        assert_eq!(req.admin_secret, "s3cret");

        let empty: AdminRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.admin_secret.is_empty());
    }
}
