//! # Partner Events
//!
//! Defines the notification events that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::entities::{AccountId, SubscriptionType};

/// Events emitted after a committed pairing or entitlement change.
///
/// Each variant is addressed to the single account that should hear about a
/// change it did not initiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PartnerEvent {
    /// Someone consumed the recipient's pairing code.
    #[serde(rename_all = "camelCase")]
    PartnerConnected {
        /// Code owner.
        recipient: AccountId,
        /// The account that connected.
        partner_id: AccountId,
        /// Whether the recipient now inherits entitlement.
        recipient_inherited: bool,
    },

    /// The recipient's partner disconnected.
    #[serde(rename_all = "camelCase")]
    PartnerDisconnected {
        /// Remaining side.
        recipient: AccountId,
        /// Side that left.
        former_partner_id: AccountId,
    },

    /// The recipient's partner deleted their account.
    #[serde(rename_all = "camelCase")]
    PartnerAccountDeleted {
        /// Remaining side.
        recipient: AccountId,
        /// Deleted account.
        deleted_account_id: AccountId,
    },

    /// The recipient's entitlement changed because of someone else's action
    /// (partner purchase lapse, orphan repair).
    #[serde(rename_all = "camelCase")]
    EntitlementChanged {
        /// Affected account.
        recipient: AccountId,
        /// New entitlement kind.
        subscription_type: SubscriptionType,
    },
}

impl PartnerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::PartnerConnected { .. }
            | Self::PartnerDisconnected { .. }
            | Self::PartnerAccountDeleted { .. } => EventTopic::Pairing,
            Self::EntitlementChanged { .. } => EventTopic::Entitlement,
        }
    }

    /// The account this event is addressed to.
    #[must_use]
    pub fn recipient(&self) -> &AccountId {
        match self {
            Self::PartnerConnected { recipient, .. }
            | Self::PartnerDisconnected { recipient, .. }
            | Self::PartnerAccountDeleted { recipient, .. }
            | Self::EntitlementChanged { recipient, .. } => recipient,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Link / unlink / partner deletion.
    Pairing,
    /// Entitlement changes.
    Entitlement,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Recipients to include. Empty means every recipient.
    pub recipients: Vec<AccountId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            recipients: Vec::new(),
        }
    }

    /// Create a filter for events addressed to one account.
    #[must_use]
    pub fn for_recipient(recipient: AccountId) -> Self {
        Self {
            topics: Vec::new(),
            recipients: vec![recipient],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &PartnerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let recipient_match =
            self.recipients.is_empty() || self.recipients.contains(event.recipient());

        topic_match && recipient_match
    }
}
