//! Deletion result.

use serde::Serialize;
use shared_types::entities::AccountId;

/// What a completed deletion touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    /// Deleted account.
    pub account_id: AccountId,
    /// Partner that was unlinked, if the link was reciprocated.
    pub former_partner_id: Option<AccountId>,
    /// Accounts that lost entitlement inherited from the deleted account.
    pub revoked_beneficiaries: Vec<AccountId>,
    /// Other accounts that still pointed at the deleted one and were cleaned.
    pub stale_references_cleared: usize,
    /// Pairing codes retired.
    pub codes_retired: Vec<String>,
    /// Cleanup stages that failed under best-effort mode.
    pub skipped_stages: Vec<&'static str>,
}
