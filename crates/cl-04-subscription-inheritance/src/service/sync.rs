//! # Entitlement Sync
//!
//! Client-triggered reconciliation of the caller's own purchase state with
//! the pair's inherited entitlement.

use super::resolver::SubscriptionInheritanceResolver;
use crate::domain::{InheritanceError, SyncOutcome};
use crate::ports::EntitlementVerifier;
use cl_01_document_store::Store;
use shared_bus::{EventPublisher, PartnerEvent};
use shared_types::entities::{Account, AccountId, SubscriptionType};
use shared_types::Clock;
use std::sync::Arc;
use tracing::{debug, info};

/// Sync-subscription service.
pub struct EntitlementSync {
    store: Store,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn EntitlementVerifier>,
    events: Arc<dyn EventPublisher>,
    resolver: SubscriptionInheritanceResolver,
}

impl EntitlementSync {
    /// Create the service.
    pub fn new(
        store: Store,
        clock: Arc<dyn Clock>,
        verifier: Arc<dyn EntitlementVerifier>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            clock,
            verifier,
            events,
            resolver: SubscriptionInheritanceResolver::new(),
        }
    }

    /// Verify the caller's purchase and re-derive the pair's entitlement.
    ///
    /// The partner is notified when their entitlement changed as a result.
    pub async fn sync_subscription(
        &self,
        account_id: &AccountId,
        proof: Option<&str>,
    ) -> Result<SyncOutcome, InheritanceError> {
        let purchase_valid = self.verifier.purchase_is_valid(account_id, proof).await?;
        let now = self.clock.now();
        let resolver = self.resolver;

        let (outcome, notify) = self
            .store
            .run_transaction(|tx| {
                let Some(mut account) = tx.get::<Account>(account_id.as_str())? else {
                    return Err(InheritanceError::AccountMissing);
                };
                let mut changed =
                    resolver.apply_purchase_state(tx, &mut account, purchase_valid, now)?;
                let mut partner_state: Option<(AccountId, SubscriptionType)> = None;
                let mut notify = None;

                let partner = match account.partner_id.clone() {
                    Some(partner_id) => tx
                        .get::<Account>(partner_id.as_str())?
                        .filter(|p| p.is_partnered_with(&account.id)),
                    None => None,
                };

                match partner {
                    Some(mut partner) => {
                        let pair = resolver.reconcile_pair(tx, &mut account, &mut partner, now)?;
                        changed |= pair.changed.contains(&account.id);
                        if pair.changed.contains(&partner.id) {
                            tx.set(&partner)?;
                            notify = Some((partner.id.clone(), partner.subscription_type));
                        }
                        partner_state = Some((partner.id, partner.subscription_type));
                    }
                    None => changed |= resolver.revoke_orphaned(tx, &mut account)?,
                }

                if changed {
                    tx.set(&account)?;
                }

                let (partner_id, partner_subscription_type) = match partner_state {
                    Some((id, kind)) => (Some(id), Some(kind)),
                    None => (None, None),
                };
                Ok((
                    SyncOutcome {
                        subscription_type: account.subscription_type,
                        partner_id,
                        partner_subscription_type,
                    },
                    notify,
                ))
            })
            .await?;

        debug!(
            account = %account_id,
            purchase_valid,
            subscription = outcome.subscription_type.as_str(),
            "Subscription synced"
        );

        if let Some((recipient, subscription_type)) = notify {
            info!(account = %recipient, subscription = subscription_type.as_str(), "Partner entitlement changed");
            self.events
                .publish(PartnerEvent::EntitlementChanged {
                    recipient,
                    subscription_type,
                })
                .await;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticEntitlementVerifier;
    use crate::ports::VerifierError;
    use chrono::DateTime;
    use shared_bus::{EventFilter, InMemoryEventBus};
    use shared_types::ManualClock;

    struct Fixture {
        store: Store,
        verifier: Arc<StaticEntitlementVerifier>,
        bus: Arc<InMemoryEventBus>,
        sync: EntitlementSync,
    }

    fn fixture() -> Fixture {
        let (store, _) = Store::in_memory();
        let verifier = Arc::new(StaticEntitlementVerifier::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let sync = EntitlementSync::new(
            store.clone(),
            Arc::new(ManualClock::at_unix(1_000)),
            verifier.clone(),
            bus.clone(),
        );
        Fixture {
            store,
            verifier,
            bus,
            sync,
        }
    }

    async fn linked(store: &Store) {
        let now = DateTime::from_timestamp(0, 0).unwrap();
        let mut a = Account::new("a", None, now);
        let mut b = Account::new("b", None, now);
        a.partner_id = Some("b".into());
        b.partner_id = Some("a".into());
        store.upsert(&a).await.unwrap();
        store.upsert(&b).await.unwrap();
    }

    #[tokio::test]
    async fn test_purchase_shares_with_partner_and_notifies() {
        let f = fixture();
        linked(&f.store).await;
        f.verifier.grant("a");
        let mut sub = f.bus.subscribe(EventFilter::for_recipient("b".into()));

        let outcome = f.sync.sync_subscription(&"a".into(), None).await.unwrap();
        assert_eq!(outcome.subscription_type, SubscriptionType::Direct);
        assert_eq!(outcome.partner_subscription_type, Some(SubscriptionType::Inherited));

        let b: Account = f.store.get("b").unwrap().unwrap();
        assert!(b.inherits_from(&"a".into()));
        assert_eq!(
            sub.try_recv().unwrap(),
            Some(PartnerEvent::EntitlementChanged {
                recipient: "b".into(),
                subscription_type: SubscriptionType::Inherited,
            })
        );
    }

    #[tokio::test]
    async fn test_lapse_revokes_partner() {
        let f = fixture();
        linked(&f.store).await;
        f.verifier.grant("a");
        f.sync.sync_subscription(&"a".into(), None).await.unwrap();

        f.verifier.revoke(&"a".into());
        let outcome = f.sync.sync_subscription(&"a".into(), None).await.unwrap();
        assert_eq!(outcome.subscription_type, SubscriptionType::None);
        assert_eq!(outcome.partner_subscription_type, Some(SubscriptionType::None));

        let b: Account = f.store.get("b").unwrap().unwrap();
        assert_eq!(b.subscription_type, SubscriptionType::None);
    }

    #[tokio::test]
    async fn test_unchanged_state_publishes_nothing() {
        let f = fixture();
        linked(&f.store).await;

        f.sync.sync_subscription(&"a".into(), None).await.unwrap();
        assert_eq!(f.bus.events_published(), 0);
    }

    #[tokio::test]
    async fn test_missing_account() {
        let f = fixture();
        assert_eq!(
            f.sync.sync_subscription(&"ghost".into(), None).await,
            Err(InheritanceError::AccountMissing)
        );
    }

    #[tokio::test]
    async fn test_verifier_outage_writes_nothing() {
        let f = fixture();
        linked(&f.store).await;
        f.verifier.set_available(false);

        let result = f.sync.sync_subscription(&"a".into(), None).await;
        assert_eq!(result, Err(InheritanceError::Verifier(VerifierError::Unavailable)));
    }
}
