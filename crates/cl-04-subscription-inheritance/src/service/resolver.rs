//! # Inheritance Resolver
//!
//! In-transaction entitlement transitions. Callers read the accounts, hand
//! them in by `&mut`, and persist whatever the resolver reports as changed.

use crate::domain::{derive_pair, EntitlementTarget, PairOutcome};
use chrono::{DateTime, Utc};
use cl_01_document_store::{StoreError, Transaction};
use shared_types::entities::{Account, AccountId, InheritanceGrant};
use tracing::{debug, warn};

/// Applies the inheritance rules to accounts inside a store transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionInheritanceResolver;

impl SubscriptionInheritanceResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Re-derive both sides of a linked pair.
    ///
    /// A direct source that already shares with a live beneficiary elsewhere
    /// does not grant a second time; the would-be beneficiary gets nothing.
    pub fn reconcile_pair(
        &self,
        tx: &mut Transaction<'_>,
        first: &mut Account,
        second: &mut Account,
        now: DateTime<Utc>,
    ) -> Result<PairOutcome, StoreError> {
        let (first_target, second_target) = derive_pair(first, second);
        let mut outcome = PairOutcome::default();

        if self.apply_target(tx, first, first_target, now)? {
            outcome.changed.push(first.id.clone());
        }
        if self.apply_target(tx, second, second_target, now)? {
            outcome.changed.push(second.id.clone());
        }
        outcome.first_inherited = first.is_inherited();
        outcome.second_inherited = second.is_inherited();
        Ok(outcome)
    }

    /// Strip entitlement from `account` only if it inherits from `departed`.
    pub fn release_on_unlink(
        &self,
        tx: &mut Transaction<'_>,
        account: &mut Account,
        departed: &AccountId,
    ) -> Result<bool, StoreError> {
        if !account.inherits_from(departed) {
            return Ok(false);
        }
        self.drop_grant(tx, departed, &account.id)?;
        account.revoke_entitlement();
        debug!(account = %account.id, source = %departed, "Inherited entitlement released");
        Ok(true)
    }

    /// Clear an inherited entitlement whose source is no longer valid.
    pub fn revoke_orphaned(
        &self,
        tx: &mut Transaction<'_>,
        account: &mut Account,
    ) -> Result<bool, StoreError> {
        if !account.is_inherited() {
            return Ok(false);
        }
        if let Some(source) = account.subscription_source_account_id.clone() {
            self.drop_grant(tx, &source, &account.id)?;
        }
        account.revoke_entitlement();
        Ok(true)
    }

    /// Apply the caller's own purchase state.
    ///
    /// A valid purchase makes the account direct, replacing any inheritance.
    /// A lapsed purchase clears a direct entitlement and the grant it backed.
    /// An inherited account without a purchase is left alone.
    pub fn apply_purchase_state(
        &self,
        tx: &mut Transaction<'_>,
        account: &mut Account,
        purchase_valid: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if purchase_valid {
            if account.is_direct() {
                return Ok(false);
            }
            self.revoke_orphaned(tx, account)?;
            account.grant_direct(now);
            return Ok(true);
        }
        if account.is_direct() {
            tx.delete::<InheritanceGrant>(account.id.as_str());
            account.revoke_entitlement();
            return Ok(true);
        }
        Ok(false)
    }

    fn apply_target(
        &self,
        tx: &mut Transaction<'_>,
        account: &mut Account,
        target: EntitlementTarget,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let before = (
            account.subscription_type,
            account.subscription_source_account_id.clone(),
        );

        match target {
            EntitlementTarget::Direct => {}
            EntitlementTarget::InheritFrom(source) => {
                if !account.inherits_from(&source) {
                    self.revoke_orphaned(tx, account)?;
                }
                if self.claim_grant(tx, &source, &account.id, now)? {
                    if !account.inherits_from(&source) {
                        account.grant_inherited(source, now);
                    }
                } else {
                    warn!(
                        account = %account.id,
                        source = %source,
                        "Source already shares with another account"
                    );
                    account.revoke_entitlement();
                }
            }
            EntitlementTarget::None => {
                self.revoke_orphaned(tx, account)?;
            }
        }

        Ok(before
            != (
                account.subscription_type,
                account.subscription_source_account_id.clone(),
            ))
    }

    /// Record `beneficiary` as `source`'s single beneficiary.
    ///
    /// Returns false when a different account still inherits from `source`.
    fn claim_grant(
        &self,
        tx: &mut Transaction<'_>,
        source: &AccountId,
        beneficiary: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if let Some(existing) = tx.get::<InheritanceGrant>(source.as_str())? {
            if &existing.beneficiary_id == beneficiary {
                return Ok(true);
            }
            let holder = tx.get::<Account>(existing.beneficiary_id.as_str())?;
            if holder.is_some_and(|h| h.inherits_from(source)) {
                return Ok(false);
            }
        }
        tx.set(&InheritanceGrant {
            source_id: source.clone(),
            beneficiary_id: beneficiary.clone(),
            granted_at: now,
        })?;
        Ok(true)
    }

    fn drop_grant(
        &self,
        tx: &mut Transaction<'_>,
        source: &AccountId,
        beneficiary: &AccountId,
    ) -> Result<(), StoreError> {
        if let Some(grant) = tx.get::<InheritanceGrant>(source.as_str())? {
            if &grant.beneficiary_id == beneficiary {
                tx.delete::<InheritanceGrant>(source.as_str());
            }
        }
        Ok(())
    }
}
