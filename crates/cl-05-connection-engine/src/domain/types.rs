//! Connection results.

use serde::Serialize;
use shared_types::entities::{Account, AccountId, SubscriptionType};

/// Successful `connect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOutcome {
    /// The code owner, now the caller's partner.
    pub partner_id: AccountId,
    /// Whether the caller now inherits entitlement from the partner.
    pub subscription_inherited: bool,
}

/// Successful `disconnect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectOutcome {
    /// The side that was left.
    pub former_partner_id: AccountId,
    /// Pairing codes retired by the unlink.
    pub released_codes: Vec<String>,
}

/// Read-only view of the caller's pairing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingStatus {
    /// Current partner.
    pub partner_id: Option<AccountId>,
    /// Entitlement kind.
    pub subscription_type: SubscriptionType,
    /// Subscribed flag.
    pub is_subscribed: bool,
    /// Someone connected and the client has not acknowledged it yet.
    pub has_unseen_connection: bool,
    /// Code the caller last issued.
    pub active_pairing_code: Option<String>,
}

impl From<&Account> for PairingStatus {
    fn from(account: &Account) -> Self {
        Self {
            partner_id: account.partner_id.clone(),
            subscription_type: account.subscription_type,
            is_subscribed: account.is_subscribed,
            has_unseen_connection: account.has_unseen_connection,
            active_pairing_code: account.active_pairing_code.clone(),
        }
    }
}
