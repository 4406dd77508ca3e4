//! # Orphan Auditor Service

use crate::domain::{classify, detect, AuditError, CleanupReport, DiagnosisReport, OrphanCategory};
use cl_01_document_store::Store;
use cl_04_subscription_inheritance::SubscriptionInheritanceResolver;
use shared_bus::{EventPublisher, PartnerEvent};
use shared_types::entities::{
    Account, AccountId, AuditAction, ConnectionAuditRecord, SubscriptionType,
};
use shared_types::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Detects and clears inherited entitlement whose source is no longer valid.
pub struct OrphanAuditor {
    store: Store,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventPublisher>,
    resolver: SubscriptionInheritanceResolver,
}

impl OrphanAuditor {
    /// Create an auditor.
    pub fn new(store: Store, clock: Arc<dyn Clock>, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            clock,
            events,
            resolver: SubscriptionInheritanceResolver::new(),
        }
    }

    /// Report violations without changing anything.
    pub fn diagnose(&self) -> Result<DiagnosisReport, AuditError> {
        let accounts = self.store.scan::<Account>()?;
        let (checked_count, violations) = detect(&accounts);
        debug!(checked = checked_count, violations = violations.len(), "Orphan diagnosis");
        Ok(DiagnosisReport {
            checked_count,
            violations,
        })
    }

    /// Clear every violation `diagnose` would report.
    ///
    /// Each candidate is re-classified inside its own transaction, so an
    /// account fixed concurrently is skipped. Running twice in a row cleans
    /// nothing the second time.
    pub async fn cleanup(&self) -> Result<CleanupReport, AuditError> {
        let DiagnosisReport {
            checked_count,
            violations,
        } = self.diagnose()?;

        let mut cleaned_count = 0;
        for violation in violations {
            if let Some(category) = self.repair(&violation.account_id).await? {
                cleaned_count += 1;
                info!(account = %violation.account_id, category = %category, "Orphaned entitlement cleared");
                self.events
                    .publish(PartnerEvent::EntitlementChanged {
                        recipient: violation.account_id,
                        subscription_type: SubscriptionType::None,
                    })
                    .await;
            } else {
                debug!(account = %violation.account_id, "Orphan resolved before repair");
            }
        }

        if cleaned_count > 0 {
            warn!(checked = checked_count, cleaned = cleaned_count, "Orphan cleanup repaired accounts");
        }
        Ok(CleanupReport {
            checked_count,
            cleaned_count,
        })
    }

    async fn repair(&self, account_id: &AccountId) -> Result<Option<OrphanCategory>, AuditError> {
        let now = self.clock.now();
        let resolver = self.resolver;

        self.store
            .run_transaction(|tx| {
                let Some(mut account) = tx.get::<Account>(account_id.as_str())? else {
                    return Ok(None);
                };
                let partner = match account.partner_id.clone() {
                    Some(id) => tx.get::<Account>(id.as_str())?,
                    None => None,
                };
                let Some(category) = classify(&account, partner.as_ref()) else {
                    return Ok(None);
                };

                let before = vec![account.entitlement_snapshot()];
                resolver.revoke_orphaned(tx, &mut account)?;
                tx.set(&account)?;
                tx.create(
                    &ConnectionAuditRecord::new(
                        AuditAction::OrphanRepair,
                        account.id.clone(),
                        account.partner_id.clone(),
                        now,
                    )
                    .with_snapshots(before, vec![account.entitlement_snapshot()]),
                )?;
                Ok::<_, AuditError>(Some(category))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use cl_01_document_store::{Collection, InMemoryDocumentStore, StoreError};
    use shared_bus::InMemoryEventBus;
    use shared_types::entities::InheritanceGrant;
    use shared_types::ManualClock;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn setup() -> (Store, Arc<InMemoryDocumentStore>, Arc<InMemoryEventBus>, OrphanAuditor) {
        let (store, backend) = Store::in_memory();
        let bus = Arc::new(InMemoryEventBus::new());
        let auditor = OrphanAuditor::new(
            store.clone(),
            Arc::new(ManualClock::at_unix(5_000)),
            bus.clone(),
        );
        (store, backend, bus, auditor)
    }

    async fn seed(store: &Store) {
        // Healthy pair: c direct, d inherits from c.
        let mut c = Account::new("c", None, at(0));
        let mut d = Account::new("d", None, at(0));
        c.partner_id = Some("d".into());
        d.partner_id = Some("c".into());
        c.grant_direct(at(0));
        d.grant_inherited("c".into(), at(0));

        // Orphan: e inherits from a deleted partner.
        let mut e = Account::new("e", None, at(0));
        e.partner_id = Some("gone".into());
        e.grant_inherited("gone".into(), at(0));

        // Orphan: f inherits from g, who lapsed.
        let mut f = Account::new("f", None, at(0));
        let mut g = Account::new("g", None, at(0));
        f.partner_id = Some("g".into());
        g.partner_id = Some("f".into());
        f.grant_inherited("g".into(), at(0));

        for account in [&c, &d, &e, &f, &g] {
            store.upsert(account).await.unwrap();
        }
        store
            .upsert(&InheritanceGrant {
                source_id: "g".into(),
                beneficiary_id: "f".into(),
                granted_at: at(0),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_diagnose_is_read_only() {
        let (store, backend, _, auditor) = setup();
        seed(&store).await;
        let commits = backend.commit_count();

        let report = auditor.diagnose().unwrap();
        assert_eq!(report.checked_count, 3);
        let mut categories: Vec<_> = report.violations.iter().map(|v| v.category).collect();
        categories.sort_by_key(|c| c.as_str());
        assert_eq!(
            categories,
            vec![OrphanCategory::PartnerDeleted, OrphanCategory::PartnerLostDirect]
        );
        assert_eq!(backend.commit_count(), commits);
    }

    #[tokio::test]
    async fn test_cleanup_matches_diagnosis_and_converges() {
        let (store, backend, bus, auditor) = setup();
        seed(&store).await;

        let preview = auditor.diagnose().unwrap();
        let first = auditor.cleanup().await.unwrap();
        assert_eq!(first.cleaned_count, preview.violations.len());
        assert_eq!(bus.events_published(), 2);

        let second = auditor.cleanup().await.unwrap();
        assert_eq!(second.cleaned_count, 0);

        let f: Account = store.get("f").unwrap().unwrap();
        assert_eq!(f.subscription_type, SubscriptionType::None);
        assert_eq!(f.partner_id, Some("g".into()));
        assert!(store.get::<InheritanceGrant>("g").unwrap().is_none());

        let d: Account = store.get("d").unwrap().unwrap();
        assert!(d.inherits_from(&"c".into()));
        assert_eq!(backend.len(Collection::ConnectionAudit), 2);
    }

    #[tokio::test]
    async fn test_cleanup_propagates_store_outage() {
        let (store, backend, _, auditor) = setup();
        seed(&store).await;
        backend.set_available(false);

        assert_eq!(
            auditor.cleanup().await,
            Err(AuditError::Store(StoreError::Unavailable))
        );
    }
}
