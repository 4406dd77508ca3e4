//! # Account Deletion Coordinator

use crate::domain::{DeletionConfig, DeletionError, DeletionMode, DeletionReport};
use crate::ports::AuthDirectory;
use chrono::{DateTime, Utc};
use cl_01_document_store::{Store, StoreError, Transaction};
use cl_03_pairing_codes::release_codes;
use cl_04_subscription_inheritance::SubscriptionInheritanceResolver;
use shared_bus::{EventPublisher, PartnerEvent};
use shared_types::entities::{
    Account, AccountId, AuditAction, ConnectionAuditRecord, DeactivationReason, InheritanceGrant,
    PairingCode,
};
use shared_types::Clock;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of the primary cascade transaction.
struct Cascade {
    former_partner_id: Option<AccountId>,
    revoked_beneficiaries: Vec<AccountId>,
    codes_retired: Vec<String>,
}

/// Coordinates account removal.
pub struct AccountDeletionCoordinator {
    store: Store,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn AuthDirectory>,
    events: Arc<dyn EventPublisher>,
    resolver: SubscriptionInheritanceResolver,
    config: DeletionConfig,
}

impl AccountDeletionCoordinator {
    /// Create a coordinator.
    pub fn new(
        store: Store,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn AuthDirectory>,
        events: Arc<dyn EventPublisher>,
        config: DeletionConfig,
    ) -> Self {
        Self {
            store,
            clock,
            directory,
            events,
            resolver: SubscriptionInheritanceResolver::new(),
            config,
        }
    }

    /// Delete `account_id` after cleaning every reference to it.
    pub async fn delete_account(
        &self,
        account_id: &AccountId,
    ) -> Result<DeletionReport, DeletionError> {
        let now = self.clock.now();
        let cascade = self
            .store
            .run_transaction(|tx| self.cascade(tx, account_id, now))
            .await?;

        let mut report = DeletionReport {
            account_id: account_id.clone(),
            former_partner_id: cascade.former_partner_id.clone(),
            revoked_beneficiaries: cascade.revoked_beneficiaries,
            stale_references_cleared: 0,
            codes_retired: cascade.codes_retired,
            skipped_stages: Vec::new(),
        };
        let mut notify: Vec<AccountId> = cascade.former_partner_id.into_iter().collect();

        match self.clear_stale_references(account_id, now).await {
            Ok(touched) => {
                report.stale_references_cleared = touched.len();
                for id in touched {
                    if !notify.contains(&id) {
                        notify.push(id);
                    }
                }
            }
            Err(e) => self.stage_failed("references", e, &mut report)?,
        }

        match self.retire_codes(account_id, now).await {
            Ok(codes) => report.codes_retired.extend(codes),
            Err(e) => self.stage_failed("codes", e, &mut report)?,
        }

        self.directory.remove_identity(account_id).await?;

        let late = self
            .store
            .run_transaction(|tx| self.finalize(tx, account_id, now))
            .await?;
        if let Some(late) = late {
            warn!(account = %account_id, partner = ?late.former_partner_id, "Account relinked during deletion, cascading again");
            if let Some(partner) = late.former_partner_id {
                if !notify.contains(&partner) {
                    notify.push(partner.clone());
                }
                report.former_partner_id.get_or_insert(partner);
            }
            report.revoked_beneficiaries.extend(late.revoked_beneficiaries);
            report.codes_retired.extend(late.codes_retired);
        }

        info!(
            account = %account_id,
            former_partner = ?report.former_partner_id,
            stale = report.stale_references_cleared,
            codes = report.codes_retired.len(),
            "Account deleted"
        );

        for recipient in notify {
            self.events
                .publish(PartnerEvent::PartnerAccountDeleted {
                    recipient,
                    deleted_account_id: account_id.clone(),
                })
                .await;
        }
        Ok(report)
    }

    fn cascade(
        &self,
        tx: &mut Transaction<'_>,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<Cascade, DeletionError> {
        let Some(mut account) = tx.get::<Account>(account_id.as_str())? else {
            return Err(DeletionError::NotFound);
        };
        let mut before = vec![account.entitlement_snapshot()];
        let mut after = Vec::new();
        let mut cascade = Cascade {
            former_partner_id: None,
            revoked_beneficiaries: Vec::new(),
            codes_retired: Vec::new(),
        };

        self.resolver.revoke_orphaned(tx, &mut account)?;

        let partner_id = account.partner_id.take();
        if let Some(partner_id) = partner_id.as_ref() {
            if let Some(mut partner) = tx.get::<Account>(partner_id.as_str())? {
                before.push(partner.entitlement_snapshot());
                if partner.is_partnered_with(&account.id) {
                    partner.partner_id = None;
                    cascade.former_partner_id = Some(partner.id.clone());
                    cascade.codes_retired.extend(release_codes(
                        tx,
                        [&mut partner],
                        DeactivationReason::PartnerDeleted,
                        now,
                    )?);
                }
                if self.resolver.release_on_unlink(tx, &mut partner, &account.id)? {
                    cascade.revoked_beneficiaries.push(partner.id.clone());
                }
                tx.set(&partner)?;
                after.push(partner.entitlement_snapshot());
            }
        }

        cascade.codes_retired.extend(release_codes(
            tx,
            [&mut account],
            DeactivationReason::OwnerDeleted,
            now,
        )?);
        // An open code survives release_codes; it must not outlive its owner.
        if let Some(token) = account.active_pairing_code.take() {
            if let Some(mut code) = tx.get::<PairingCode>(&token)? {
                if code.owner_id == account.id && code.is_active {
                    code.deactivate(DeactivationReason::OwnerDeleted, now);
                    tx.set(&code)?;
                    cascade.codes_retired.push(token);
                }
            }
        }

        tx.set(&account)?;
        after.insert(0, account.entitlement_snapshot());
        tx.create(
            &ConnectionAuditRecord::new(AuditAction::AccountDeleted, account.id.clone(), partner_id, now)
                .with_snapshots(before, after),
        )?;
        Ok(cascade)
    }

    /// Remove the account document. A partner or code picked up since the
    /// cascade committed is released in the same transaction.
    fn finalize(
        &self,
        tx: &mut Transaction<'_>,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<Option<Cascade>, DeletionError> {
        let relinked = match tx.get::<Account>(account_id.as_str())? {
            Some(account) => account.partner_id.is_some() || account.active_pairing_code.is_some(),
            None => false,
        };
        let late = if relinked {
            Some(self.cascade(tx, account_id, now)?)
        } else {
            None
        };
        tx.delete::<Account>(account_id.as_str());
        tx.delete::<InheritanceGrant>(account_id.as_str());
        Ok(late)
    }

    /// Clean accounts that still name `deleted` as partner or source.
    async fn clear_stale_references(
        &self,
        deleted: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<Vec<AccountId>, StoreError> {
        let candidates: Vec<AccountId> = self
            .store
            .scan::<Account>()?
            .into_iter()
            .filter(|a| a.id != *deleted && (a.is_partnered_with(deleted) || a.inherits_from(deleted)))
            .map(|a| a.id)
            .collect();

        let resolver = self.resolver;
        let mut touched = Vec::new();
        for id in candidates {
            let cleaned = self
                .store
                .run_transaction(|tx| {
                    let Some(mut account) = tx.get::<Account>(id.as_str())? else {
                        return Ok(false);
                    };
                    let mut changed = false;
                    if account.is_partnered_with(deleted) {
                        account.partner_id = None;
                        release_codes(tx, [&mut account], DeactivationReason::PartnerDeleted, now)?;
                        changed = true;
                    }
                    changed |= resolver.release_on_unlink(tx, &mut account, deleted)?;
                    if changed {
                        tx.set(&account)?;
                    }
                    Ok::<_, StoreError>(changed)
                })
                .await?;
            if cleaned {
                warn!(account = %id, deleted = %deleted, "Cleared stale reference to deleted account");
                touched.push(id);
            }
        }
        Ok(touched)
    }

    /// Retire active codes owned or consumed by `deleted`.
    async fn retire_codes(
        &self,
        deleted: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        let touches = |code: &PairingCode| {
            code.is_active
                && (code.owner_id == *deleted || code.connected_partner_id.as_ref() == Some(deleted))
        };
        let candidates: Vec<String> = self
            .store
            .scan::<PairingCode>()?
            .into_iter()
            .filter(|c| touches(c))
            .map(|c| c.code)
            .collect();

        let mut retired = Vec::new();
        for token in candidates {
            let done = self
                .store
                .run_transaction(|tx| {
                    let Some(mut code) = tx.get::<PairingCode>(&token)? else {
                        return Ok(false);
                    };
                    if !touches(&code) {
                        return Ok(false);
                    }
                    let reason = if code.owner_id == *deleted {
                        DeactivationReason::OwnerDeleted
                    } else {
                        DeactivationReason::PartnerDeleted
                    };
                    code.deactivate(reason, now);
                    tx.set(&code)?;
                    Ok::<_, StoreError>(true)
                })
                .await?;
            if done {
                debug!(code = %token, deleted = %deleted, "Retired code of deleted account");
                retired.push(token);
            }
        }
        Ok(retired)
    }

    fn stage_failed(
        &self,
        stage: &'static str,
        source: StoreError,
        report: &mut DeletionReport,
    ) -> Result<(), DeletionError> {
        match self.config.mode {
            DeletionMode::Strict => {
                error!(account = %report.account_id, stage, error = %source, "Deletion cleanup failed, aborting");
                Err(DeletionError::Cleanup { stage, source })
            }
            DeletionMode::BestEffort => {
                error!(account = %report.account_id, stage, error = %source, "Deletion cleanup failed, continuing");
                report.skipped_stages.push(stage);
                Ok(())
            }
        }
    }
}
