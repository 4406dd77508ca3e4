//! # Core Domain Entities
//!
//! Defines the documents persisted by the shared store.
//!
//! ## Clusters
//!
//! - **Identity**: `Account`, `AccountId`, `SubscriptionType`
//! - **Pairing**: `PairingCode`, `DeactivationReason`
//! - **Entitlement**: `InheritanceGrant`, `EntitlementSnapshot`
//! - **Guarding & Compliance**: `RateLimitWindow`, `SecurityEvent`,
//!   `ConnectionAuditRecord`
//!
//! ## Ownership
//!
//! Only the connection engine writes `partner_id` / `connected_partner_id`
//! pairs, and only the inheritance resolver writes the subscription fields.
//! The mutators below exist for those two writers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Opaque account identifier issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AccountId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How an account holds premium entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    /// No entitlement.
    #[default]
    None,
    /// Self-purchased entitlement.
    Direct,
    /// Entitlement shared by the current partner.
    Inherited,
}

impl SubscriptionType {
    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Direct => "direct",
            Self::Inherited => "inherited",
        }
    }
}

/// Schema violations detected while reading an account document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountSchemaError {
    /// The document has an empty `id`.
    #[error("account document has an empty id")]
    EmptyId,
}

/// Identity record.
///
/// Invariants (maintained by the writers, repaired by the orphan auditor):
/// - `subscription_type == Inherited` implies `subscription_source_account_id`
///   names the current partner, and that partner is `Direct`.
/// - `partner_id` is symmetric across the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AccountRecord")]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Name shown to a prospective partner while validating a code.
    pub display_name: Option<String>,
    /// Linked partner, at most one.
    pub partner_id: Option<AccountId>,
    /// Mirrors `subscription_type != None`.
    pub is_subscribed: bool,
    /// Entitlement source kind.
    pub subscription_type: SubscriptionType,
    /// Account the entitlement is inherited from. Set iff inherited.
    pub subscription_source_account_id: Option<AccountId>,
    /// When the current entitlement was granted.
    pub subscription_source_timestamp: Option<DateTime<Utc>>,
    /// Set on the code owner when someone connects, cleared by the client.
    pub has_unseen_connection: bool,
    /// The code this account last issued, if any.
    pub active_pairing_code: Option<String>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

/// Raw on-disk account shape, including legacy field spellings.
///
/// Two historical names exist for the inheritance source
/// (`subscriptionInheritedFrom`, `subscriptionSharedFrom`). Both are read,
/// neither is ever written back.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    id: AccountId,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    partner_id: Option<AccountId>,
    #[serde(default)]
    is_subscribed: bool,
    #[serde(default)]
    subscription_type: Option<SubscriptionType>,
    #[serde(default)]
    subscription_source_account_id: Option<AccountId>,
    #[serde(default)]
    subscription_inherited_from: Option<AccountId>,
    #[serde(default)]
    subscription_shared_from: Option<AccountId>,
    #[serde(default)]
    subscription_source_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    has_unseen_connection: bool,
    #[serde(default)]
    active_pairing_code: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Legacy writers stored "no value" as an empty string.
fn non_empty(id: Option<AccountId>) -> Option<AccountId> {
    id.filter(|id| !id.0.is_empty())
}

impl TryFrom<AccountRecord> for Account {
    type Error = AccountSchemaError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        if record.id.0.is_empty() {
            return Err(AccountSchemaError::EmptyId);
        }

        let source = non_empty(record.subscription_source_account_id)
            .or_else(|| non_empty(record.subscription_inherited_from))
            .or_else(|| non_empty(record.subscription_shared_from));

        // Pre-enum documents only carried the boolean flag.
        let subscription_type = record.subscription_type.unwrap_or(
            match (record.is_subscribed, source.is_some()) {
                (true, true) => SubscriptionType::Inherited,
                (true, false) => SubscriptionType::Direct,
                (false, _) => SubscriptionType::None,
            },
        );

        let source = match subscription_type {
            SubscriptionType::Inherited => source,
            _ => None,
        };

        Ok(Self {
            id: record.id,
            display_name: record.display_name,
            partner_id: non_empty(record.partner_id),
            is_subscribed: subscription_type != SubscriptionType::None,
            subscription_type,
            subscription_source_account_id: source,
            subscription_source_timestamp: record.subscription_source_timestamp,
            has_unseen_connection: record.has_unseen_connection,
            active_pairing_code: record.active_pairing_code.filter(|c| !c.is_empty()),
            created_at: record.created_at.unwrap_or_default(),
        })
    }
}

impl Account {
    /// Create a fresh unpaired, unsubscribed account.
    pub fn new(id: impl Into<AccountId>, display_name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            display_name,
            partner_id: None,
            is_subscribed: false,
            subscription_type: SubscriptionType::None,
            subscription_source_account_id: None,
            subscription_source_timestamp: None,
            has_unseen_connection: false,
            active_pairing_code: None,
            created_at: now,
        }
    }

    /// Self-purchased entitlement.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.subscription_type == SubscriptionType::Direct
    }

    /// Entitlement shared by someone else.
    #[must_use]
    pub fn is_inherited(&self) -> bool {
        self.subscription_type == SubscriptionType::Inherited
    }

    /// Inherited specifically from `source`.
    #[must_use]
    pub fn inherits_from(&self, source: &AccountId) -> bool {
        self.is_inherited() && self.subscription_source_account_id.as_ref() == Some(source)
    }

    /// Linked to `other`.
    #[must_use]
    pub fn is_partnered_with(&self, other: &AccountId) -> bool {
        self.partner_id.as_ref() == Some(other)
    }

    /// Mark as a direct subscriber.
    pub fn grant_direct(&mut self, now: DateTime<Utc>) {
        if !self.is_direct() {
            self.subscription_source_timestamp = Some(now);
        }
        self.subscription_type = SubscriptionType::Direct;
        self.subscription_source_account_id = None;
        self.is_subscribed = true;
    }

    /// Mark as inheriting from `source`.
    pub fn grant_inherited(&mut self, source: AccountId, now: DateTime<Utc>) {
        self.subscription_type = SubscriptionType::Inherited;
        self.subscription_source_account_id = Some(source);
        self.subscription_source_timestamp = Some(now);
        self.is_subscribed = true;
    }

    /// Drop any entitlement.
    pub fn revoke_entitlement(&mut self) {
        self.subscription_type = SubscriptionType::None;
        self.subscription_source_account_id = None;
        self.subscription_source_timestamp = None;
        self.is_subscribed = false;
    }

    /// Entitlement state for audit records.
    #[must_use]
    pub fn entitlement_snapshot(&self) -> EntitlementSnapshot {
        EntitlementSnapshot {
            account_id: self.id.clone(),
            subscription_type: self.subscription_type,
            is_subscribed: self.is_subscribed,
            source_account_id: self.subscription_source_account_id.clone(),
            partner_id: self.partner_id.clone(),
        }
    }
}

// =============================================================================
// CLUSTER B: PAIRING
// =============================================================================

/// Default pairing code lifetime.
pub const DEFAULT_CODE_TTL_HOURS: i64 = 24;

/// Why a pairing code stopped being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeactivationReason {
    /// Found past `expires_at` on read.
    Expired,
    /// The owner account no longer exists.
    OwnerMissing,
    /// The owner deleted their account.
    OwnerDeleted,
    /// The connected partner deleted their account.
    PartnerDeleted,
    /// The pair disconnected; codes are never reopened.
    Disconnected,
    /// The owner paired through another code or minted a replacement.
    Superseded,
}

/// Short-lived token an owner shares with a prospective partner.
///
/// Invariant: `connected_partner_id.is_some()` implies `is_active` and
/// `connected_partner_id != Some(owner_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingCode {
    /// Opaque numeric token, primary key.
    pub code: String,
    /// Issuing account.
    pub owner_id: AccountId,
    /// False once expired, consumed-and-disconnected, or orphaned.
    pub is_active: bool,
    /// Account that consumed the code.
    pub connected_partner_id: Option<AccountId>,
    /// Issue time.
    pub created_at: DateTime<Utc>,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
    /// When the code was retired.
    #[serde(default)]
    pub deactivated_at: Option<DateTime<Utc>>,
    /// Why the code was retired.
    #[serde(default)]
    pub deactivation_reason: Option<DeactivationReason>,
}

impl PairingCode {
    /// New active code for `owner_id` living `ttl`.
    pub fn issue(code: String, owner_id: AccountId, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            code,
            owner_id,
            is_active: true,
            connected_partner_id: None,
            created_at: now,
            expires_at: now + ttl,
            deactivated_at: None,
            deactivation_reason: None,
        }
    }

    /// Past its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Already consumed by a connection.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.connected_partner_id.is_some()
    }

    /// Active, unexpired and not consumed.
    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now) && !self.is_consumed()
    }

    /// Retire the code. Also clears the connection slot so the
    /// active/connected invariant holds.
    pub fn deactivate(&mut self, reason: DeactivationReason, now: DateTime<Utc>) {
        self.is_active = false;
        self.connected_partner_id = None;
        self.deactivated_at = Some(now);
        self.deactivation_reason = Some(reason);
    }
}

// =============================================================================
// CLUSTER C: ENTITLEMENT
// =============================================================================

/// Marker that `source_id` currently shares entitlement with `beneficiary_id`.
///
/// Keyed by `source_id`, which makes "at most one beneficiary per direct
/// subscriber" a single-document check inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritanceGrant {
    /// Direct subscriber sharing the entitlement.
    pub source_id: AccountId,
    /// Account inheriting it.
    pub beneficiary_id: AccountId,
    /// Grant time.
    pub granted_at: DateTime<Utc>,
}

/// Point-in-time entitlement view of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementSnapshot {
    /// Account described.
    pub account_id: AccountId,
    /// Entitlement kind.
    pub subscription_type: SubscriptionType,
    /// Subscribed flag.
    pub is_subscribed: bool,
    /// Inheritance source.
    pub source_account_id: Option<AccountId>,
    /// Partner at snapshot time.
    pub partner_id: Option<AccountId>,
}

// =============================================================================
// CLUSTER D: GUARDING & COMPLIANCE
// =============================================================================

/// Call counter for one `(account, operation, bucket)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitWindow {
    /// Caller.
    pub account_id: AccountId,
    /// Guarded operation name.
    pub operation: String,
    /// `floor(unix_minutes / window_minutes)`.
    pub window_bucket: i64,
    /// Window length the bucket was computed with.
    pub window_minutes: u32,
    /// Calls recorded in this bucket.
    pub count: u32,
    /// Most recent call, drives the retention sweep.
    pub last_call_at: DateTime<Utc>,
}

impl RateLimitWindow {
    /// Document id for a window.
    #[must_use]
    pub fn window_id(account_id: &AccountId, operation: &str, window_bucket: i64) -> String {
        format!("{}:{}:{}", account_id, operation, window_bucket)
    }

    /// Empty window, created lazily on first call.
    pub fn open(
        account_id: AccountId,
        operation: &str,
        window_bucket: i64,
        window_minutes: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            operation: operation.to_string(),
            window_bucket,
            window_minutes,
            count: 0,
            last_call_at: now,
        }
    }

    /// This window's document id.
    #[must_use]
    pub fn id(&self) -> String {
        Self::window_id(&self.account_id, &self.operation, self.window_bucket)
    }

    /// Count one call.
    pub fn record_call(&mut self, now: DateTime<Utc>) {
        self.count = self.count.saturating_add(1);
        self.last_call_at = now;
    }
}

/// Kind of security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityEventKind {
    /// Call over the limit while running in log-only mode.
    RateLimitExceeded,
}

/// Persisted security observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    /// Event id.
    pub id: Uuid,
    /// Offending caller.
    pub account_id: AccountId,
    /// Operation name.
    pub operation: String,
    /// What happened.
    pub kind: SecurityEventKind,
    /// Calls observed in the window, including this one.
    pub observed_count: u32,
    /// Configured limit.
    pub limit: u32,
    /// Observation time.
    pub recorded_at: DateTime<Utc>,
}

/// What an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditAction {
    /// Pair linked.
    Connect,
    /// Pair unlinked by one side.
    Disconnect,
    /// Pair unlinked because one side deleted their account.
    AccountDeleted,
    /// Inconsistent entitlement cleared by the orphan auditor.
    OrphanRepair,
}

/// Append-only compliance record of a pairing state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionAuditRecord {
    /// Record id.
    pub id: Uuid,
    /// What happened.
    pub action: AuditAction,
    /// Account whose call caused the change.
    pub initiator_id: AccountId,
    /// The other side, if any.
    pub counterpart_id: Option<AccountId>,
    /// Pairing code involved.
    pub pairing_code: Option<String>,
    /// Entitlement before the change.
    pub before: Vec<EntitlementSnapshot>,
    /// Entitlement after the change.
    pub after: Vec<EntitlementSnapshot>,
    /// Commit time.
    pub recorded_at: DateTime<Utc>,
}

impl ConnectionAuditRecord {
    /// Start a record.
    pub fn new(
        action: AuditAction,
        initiator_id: AccountId,
        counterpart_id: Option<AccountId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            initiator_id,
            counterpart_id,
            pairing_code: None,
            before: Vec::new(),
            after: Vec::new(),
            recorded_at: now,
        }
    }

    /// Attach the code involved.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.pairing_code = Some(code.into());
        self
    }

    /// Attach before/after entitlement views.
    #[must_use]
    pub fn with_snapshots(
        mut self,
        before: Vec<EntitlementSnapshot>,
        after: Vec<EntitlementSnapshot>,
    ) -> Self {
        self.before = before;
        self.after = after;
        self
    }
}
