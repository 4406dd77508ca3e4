//! Pure entitlement rules.

use serde::Serialize;
use shared_types::entities::{Account, AccountId, SubscriptionType};

/// Entitlement an account should hold given its pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementTarget {
    /// Keep the self-purchased entitlement.
    Direct,
    /// Inherit from the named partner.
    InheritFrom(AccountId),
    /// No entitlement.
    None,
}

/// Target entitlement for each side of a linked pair, `(for a, for b)`.
#[must_use]
pub fn derive_pair(a: &Account, b: &Account) -> (EntitlementTarget, EntitlementTarget) {
    (target_for(a, b), target_for(b, a))
}

fn target_for(account: &Account, partner: &Account) -> EntitlementTarget {
    if account.is_direct() {
        EntitlementTarget::Direct
    } else if partner.is_direct() {
        EntitlementTarget::InheritFrom(partner.id.clone())
    } else {
        EntitlementTarget::None
    }
}

/// What `reconcile_pair` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairOutcome {
    /// First account now inherits.
    pub first_inherited: bool,
    /// Second account now inherits.
    pub second_inherited: bool,
    /// Accounts whose entitlement changed.
    pub changed: Vec<AccountId>,
}

/// Result of the entitlement sync path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    /// Caller's entitlement after sync.
    pub subscription_type: SubscriptionType,
    /// Caller's partner, if any.
    pub partner_id: Option<AccountId>,
    /// Partner's entitlement after sync.
    pub partner_subscription_type: Option<SubscriptionType>,
}
