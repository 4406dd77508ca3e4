//! # Orphan Detection
//!
//! One classification function shared by `diagnose` and `cleanup`, so the
//! report is an exact preview of the repair.

use serde::Serialize;
use shared_types::entities::{Account, AccountId};
use std::collections::HashMap;
use std::fmt;

/// Why an inherited entitlement is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanCategory {
    /// No partner, or the partner does not point back.
    NoPartner,
    /// The partner document no longer exists.
    PartnerDeleted,
    /// The partner is no longer a direct subscriber.
    #[serde(rename = "partner-lost-direct-subscription")]
    PartnerLostDirect,
    /// The partner is live and direct but the recorded source is someone else.
    SourceNotPartner,
}

impl OrphanCategory {
    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPartner => "no-partner",
            Self::PartnerDeleted => "partner-deleted",
            Self::PartnerLostDirect => "partner-lost-direct-subscription",
            Self::SourceNotPartner => "source-not-partner",
        }
    }
}

impl fmt::Display for OrphanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One account in violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanViolation {
    /// Account holding the invalid entitlement.
    pub account_id: AccountId,
    /// Category.
    pub category: OrphanCategory,
    /// Partner recorded on the account.
    pub partner_id: Option<AccountId>,
    /// Recorded inheritance source.
    pub source_account_id: Option<AccountId>,
}

/// Read-only audit result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisReport {
    /// Inherited accounts examined.
    pub checked_count: usize,
    /// Violations found.
    pub violations: Vec<OrphanViolation>,
}

/// Repair result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    /// Inherited accounts examined.
    pub checked_count: usize,
    /// Accounts whose entitlement was cleared.
    pub cleaned_count: usize,
}

/// Classify one account against its partner document (`None` if absent).
#[must_use]
pub fn classify(account: &Account, partner: Option<&Account>) -> Option<OrphanCategory> {
    if !account.is_inherited() {
        return None;
    }
    let Some(partner_id) = account.partner_id.as_ref() else {
        return Some(OrphanCategory::NoPartner);
    };
    let Some(partner) = partner else {
        return Some(OrphanCategory::PartnerDeleted);
    };
    if partner.id != *partner_id || !partner.is_partnered_with(&account.id) {
        return Some(OrphanCategory::NoPartner);
    }
    if !partner.is_direct() {
        return Some(OrphanCategory::PartnerLostDirect);
    }
    if !account.inherits_from(partner_id) {
        return Some(OrphanCategory::SourceNotPartner);
    }
    None
}

/// Scan a snapshot of all accounts. Returns the number of inherited accounts
/// examined and the violations found.
#[must_use]
pub fn detect(accounts: &[Account]) -> (usize, Vec<OrphanViolation>) {
    let by_id: HashMap<&AccountId, &Account> = accounts.iter().map(|a| (&a.id, a)).collect();
    let mut checked = 0;
    let mut violations = Vec::new();

    for account in accounts.iter().filter(|a| a.is_inherited()) {
        checked += 1;
        let partner = account
            .partner_id
            .as_ref()
            .and_then(|id| by_id.get(id).copied());
        if let Some(category) = classify(account, partner) {
            violations.push(OrphanViolation {
                account_id: account.id.clone(),
                category,
                partner_id: account.partner_id.clone(),
                source_account_id: account.subscription_source_account_id.clone(),
            });
        }
    }
    (checked, violations)
}
