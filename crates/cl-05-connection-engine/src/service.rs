//! # Connection Transaction Engine

use crate::domain::{
    ConnectOutcome, ConnectionConfig, ConnectionError, DisconnectOutcome, PairingStatus,
};
use chrono::{DateTime, Utc};
use cl_01_document_store::{Store, Transaction};
use cl_03_pairing_codes::{
    check_code, release_codes, CheckedCode, PairingCodeRegistry, PairingError,
};
use cl_04_subscription_inheritance::SubscriptionInheritanceResolver;
use shared_bus::{EventPublisher, PartnerEvent};
use shared_types::entities::{
    Account, AccountId, AuditAction, ConnectionAuditRecord, DeactivationReason, PairingCode,
};
use shared_types::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one link transaction.
enum Link {
    Linked {
        outcome: ConnectOutcome,
        owner_id: AccountId,
        owner_inherited: bool,
    },
    /// The code changed after validation.
    Stale(PairingError),
}

/// Connects and disconnects partners.
pub struct ConnectionTransactionEngine {
    store: Store,
    clock: Arc<dyn Clock>,
    registry: Arc<PairingCodeRegistry>,
    events: Arc<dyn EventPublisher>,
    resolver: SubscriptionInheritanceResolver,
    config: ConnectionConfig,
}

impl ConnectionTransactionEngine {
    /// Create the engine.
    pub fn new(
        store: Store,
        clock: Arc<dyn Clock>,
        registry: Arc<PairingCodeRegistry>,
        events: Arc<dyn EventPublisher>,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            store,
            clock,
            registry,
            events,
            resolver: SubscriptionInheritanceResolver::new(),
            config,
        }
    }

    /// Link `requester_id` to the owner of `raw_code`.
    pub async fn connect(
        &self,
        requester_id: &AccountId,
        raw_code: &str,
    ) -> Result<ConnectOutcome, ConnectionError> {
        let token = self.registry.normalize(raw_code)?;
        let rounds = self.config.max_connect_rounds.max(1);
        let mut last_rejection = None;

        for round in 1..=rounds {
            self.registry.validate_code(&token, requester_id).await?;
            let now = self.clock.now();

            let link = self
                .store
                .run_transaction(|tx| self.link(tx, &token, requester_id, now))
                .await?;

            match link {
                Link::Linked {
                    outcome,
                    owner_id,
                    owner_inherited,
                } => {
                    info!(
                        requester = %requester_id,
                        owner = %owner_id,
                        code = %token,
                        inherited = outcome.subscription_inherited,
                        "Partners connected"
                    );
                    self.events
                        .publish(PartnerEvent::PartnerConnected {
                            recipient: owner_id,
                            partner_id: requester_id.clone(),
                            recipient_inherited: owner_inherited,
                        })
                        .await;
                    return Ok(outcome);
                }
                Link::Stale(rejection) => {
                    debug!(requester = %requester_id, code = %token, round, reason = %rejection, "Code changed after validation");
                    last_rejection = Some(rejection);
                }
            }
        }

        let rejection = last_rejection.unwrap_or(PairingError::AlreadyUsed);
        warn!(requester = %requester_id, code = %token, reason = %rejection, "Connect abandoned");
        Err(rejection.into())
    }

    fn link(
        &self,
        tx: &mut Transaction<'_>,
        token: &str,
        requester_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<Link, ConnectionError> {
        let CheckedCode {
            code: mut pairing,
            mut owner,
            mut requester,
        } = match check_code(tx, token, requester_id, now)? {
            Ok(checked) => checked,
            Err(rejection) => return Ok(Link::Stale(rejection)),
        };
        let before = vec![requester.entitlement_snapshot(), owner.entitlement_snapshot()];

        pairing.connected_partner_id = Some(requester.id.clone());
        owner.partner_id = Some(requester.id.clone());
        requester.partner_id = Some(owner.id.clone());

        // The requester's own unconsumed code can no longer be used.
        if let Some(own) = requester.active_pairing_code.take() {
            if let Some(mut code) = tx.get::<PairingCode>(&own)? {
                if code.owner_id == requester.id && code.is_active && !code.is_consumed() {
                    code.deactivate(DeactivationReason::Superseded, now);
                    tx.set(&code)?;
                }
            }
        }

        let pair = self
            .resolver
            .reconcile_pair(tx, &mut requester, &mut owner, now)?;
        owner.has_unseen_connection = true;

        tx.set(&pairing)?;
        tx.set(&owner)?;
        tx.set(&requester)?;

        let after = vec![requester.entitlement_snapshot(), owner.entitlement_snapshot()];
        tx.create(
            &ConnectionAuditRecord::new(
                AuditAction::Connect,
                requester.id.clone(),
                Some(owner.id.clone()),
                now,
            )
            .with_code(pairing.code.clone())
            .with_snapshots(before, after),
        )?;

        Ok(Link::Linked {
            outcome: ConnectOutcome {
                partner_id: owner.id.clone(),
                subscription_inherited: pair.first_inherited,
            },
            owner_id: owner.id,
            owner_inherited: pair.second_inherited,
        })
    }

    /// Unlink the caller from their partner.
    ///
    /// A partner document that no longer exists is tolerated: the caller's
    /// side is still cleaned.
    pub async fn disconnect(
        &self,
        requester_id: &AccountId,
    ) -> Result<DisconnectOutcome, ConnectionError> {
        let now = self.clock.now();
        let resolver = self.resolver;

        let (outcome, linked_back) = self
            .store
            .run_transaction(|tx| {
                let Some(mut requester) = tx.get::<Account>(requester_id.as_str())? else {
                    return Err(ConnectionError::AccountMissing);
                };
                let Some(partner_id) = requester.partner_id.clone() else {
                    return Err(ConnectionError::NoPartner);
                };
                let mut partner = tx.get::<Account>(partner_id.as_str())?;
                let linked_back = partner
                    .as_ref()
                    .is_some_and(|p| p.is_partnered_with(&requester.id));

                let mut before = vec![requester.entitlement_snapshot()];
                before.extend(partner.as_ref().map(Account::entitlement_snapshot));

                requester.partner_id = None;
                resolver.release_on_unlink(tx, &mut requester, &partner_id)?;

                let released = match partner.as_mut() {
                    Some(other) if linked_back => {
                        other.partner_id = None;
                        resolver.release_on_unlink(tx, other, &requester.id)?;
                        let released = release_codes(
                            tx,
                            [&mut requester, &mut *other],
                            DeactivationReason::Disconnected,
                            now,
                        )?;
                        tx.set(&*other)?;
                        released
                    }
                    // Partner gone or linked elsewhere: only our side is ours to clean.
                    _ => release_codes(
                        tx,
                        [&mut requester],
                        DeactivationReason::Disconnected,
                        now,
                    )?,
                };
                tx.set(&requester)?;

                let mut after = vec![requester.entitlement_snapshot()];
                after.extend(partner.as_ref().map(Account::entitlement_snapshot));
                tx.create(
                    &ConnectionAuditRecord::new(
                        AuditAction::Disconnect,
                        requester.id.clone(),
                        Some(partner_id.clone()),
                        now,
                    )
                    .with_snapshots(before, after),
                )?;

                Ok((
                    DisconnectOutcome {
                        former_partner_id: partner_id,
                        released_codes: released,
                    },
                    linked_back,
                ))
            })
            .await?;

        info!(
            requester = %requester_id,
            former_partner = %outcome.former_partner_id,
            released = outcome.released_codes.len(),
            "Partners disconnected"
        );
        if linked_back {
            self.events
                .publish(PartnerEvent::PartnerDisconnected {
                    recipient: outcome.former_partner_id.clone(),
                    former_partner_id: requester_id.clone(),
                })
                .await;
        } else {
            warn!(requester = %requester_id, partner = %outcome.former_partner_id, "Partner missing or linked elsewhere");
        }
        Ok(outcome)
    }

    /// Clear the caller's unseen-connection flag.
    pub async fn acknowledge_connection(
        &self,
        account_id: &AccountId,
    ) -> Result<(), ConnectionError> {
        self.store
            .run_transaction(|tx| {
                let Some(mut account) = tx.get::<Account>(account_id.as_str())? else {
                    return Err(ConnectionError::AccountMissing);
                };
                if account.has_unseen_connection {
                    account.has_unseen_connection = false;
                    tx.set(&account)?;
                }
                Ok(())
            })
            .await
    }

    /// Caller's partner, entitlement and unseen flag.
    pub fn pairing_status(&self, account_id: &AccountId) -> Result<PairingStatus, ConnectionError> {
        match self.store.get::<Account>(account_id.as_str())? {
            Some(account) => Ok(PairingStatus::from(&account)),
            None => Err(ConnectionError::AccountMissing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cl_01_document_store::InMemoryDocumentStore;
    use cl_03_pairing_codes::{PairingCodeConfig, SequenceCodeSource};
    use shared_bus::{EventFilter, InMemoryEventBus};
    use shared_types::entities::{InheritanceGrant, SubscriptionType};
    use shared_types::ManualClock;

    struct Fixture {
        store: Store,
        backend: Arc<InMemoryDocumentStore>,
        clock: Arc<ManualClock>,
        codes: Arc<SequenceCodeSource>,
        registry: Arc<PairingCodeRegistry>,
        bus: Arc<InMemoryEventBus>,
        engine: ConnectionTransactionEngine,
    }

    fn fixture() -> Fixture {
        let (store, backend) = Store::in_memory();
        let clock = Arc::new(ManualClock::at_unix(1_700_000_000));
        let codes = Arc::new(SequenceCodeSource::default());
        let registry = Arc::new(PairingCodeRegistry::new(
            store.clone(),
            clock.clone(),
            codes.clone(),
            PairingCodeConfig::default(),
        ));
        let bus = Arc::new(InMemoryEventBus::new());
        let engine = ConnectionTransactionEngine::new(
            store.clone(),
            clock.clone(),
            registry.clone(),
            bus.clone(),
            ConnectionConfig::default(),
        );
        Fixture {
            store,
            backend,
            clock,
            codes,
            registry,
            bus,
            engine,
        }
    }

    impl Fixture {
        async fn account(&self, id: &str, direct: bool) {
            let mut account = Account::new(id, Some(id.to_uppercase()), self.clock.now());
            if direct {
                account.grant_direct(self.clock.now());
            }
            self.store.upsert(&account).await.unwrap();
        }

        async fn issue(&self, owner: &str, code: &str) {
            self.codes.push(code);
            self.registry.issue_code(&owner.into()).await.unwrap();
        }

        fn load(&self, id: &str) -> Account {
            self.store.get(id).unwrap().unwrap()
        }
    }

    #[tokio::test]
    async fn test_connect_links_both_sides_and_inherits() {
        let f = fixture();
        f.account("a", true).await;
        f.account("b", false).await;
        f.issue("a", "12345678").await;
        let mut sub = f.bus.subscribe(EventFilter::for_recipient("a".into()));

        let outcome = f.engine.connect(&"b".into(), "12345678").await.unwrap();
        assert_eq!(outcome.partner_id, AccountId::from("a"));
        assert!(outcome.subscription_inherited);

        let (a, b) = (f.load("a"), f.load("b"));
        assert_eq!(a.partner_id, Some("b".into()));
        assert_eq!(b.partner_id, Some("a".into()));
        assert!(a.has_unseen_connection);
        assert!(b.inherits_from(&"a".into()));

        let code: PairingCode = f.store.get("12345678").unwrap().unwrap();
        assert_eq!(code.connected_partner_id, Some("b".into()));
        assert!(code.is_active);

        assert_eq!(f.backend.len(cl_01_document_store::Collection::ConnectionAudit), 1);
        assert!(matches!(
            sub.try_recv().unwrap(),
            Some(PartnerEvent::PartnerConnected { recipient_inherited: false, .. })
        ));
    }

    #[tokio::test]
    async fn test_owner_inherits_from_direct_requester() {
        let f = fixture();
        f.account("a", false).await;
        f.account("b", true).await;
        f.issue("a", "12345678").await;

        let outcome = f.engine.connect(&"b".into(), "12345678").await.unwrap();
        assert!(!outcome.subscription_inherited);
        assert!(f.load("a").inherits_from(&"b".into()));
    }

    #[tokio::test]
    async fn test_second_connect_on_consumed_code_is_rejected() {
        let f = fixture();
        f.account("a", false).await;
        f.account("b", false).await;
        f.account("c", false).await;
        f.issue("a", "12345678").await;

        f.engine.connect(&"b".into(), "12345678").await.unwrap();
        let err = f.engine.connect(&"c".into(), "12345678").await.unwrap_err();
        assert_eq!(err, ConnectionError::Rejected(PairingError::AlreadyUsed));
        assert!(f.load("c").partner_id.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_connects_have_one_winner() {
        let f = Arc::new(fixture());
        f.account("owner", false).await;
        for i in 0..6 {
            f.account(&format!("r{i}"), false).await;
        }
        f.issue("owner", "12345678").await;

        let mut handles = Vec::new();
        for i in 0..6 {
            let f = f.clone();
            handles.push(tokio::spawn(async move {
                f.engine.connect(&format!("r{i}").into(), "12345678").await
            }));
        }
        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);

        let owner = f.load("owner");
        let partner = owner.partner_id.clone().unwrap();
        assert_eq!(f.load(partner.as_str()).partner_id, Some("owner".into()));
    }

    #[tokio::test]
    async fn test_connect_retires_requesters_open_code() {
        let f = fixture();
        f.account("a", false).await;
        f.account("b", false).await;
        f.issue("a", "11111111").await;
        f.issue("b", "22222222").await;

        f.engine.connect(&"b".into(), "11111111").await.unwrap();

        let own: PairingCode = f.store.get("22222222").unwrap().unwrap();
        assert!(!own.is_active);
        assert_eq!(own.deactivation_reason, Some(DeactivationReason::Superseded));
        assert!(f.load("b").active_pairing_code.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_cleans_both_directions() {
        let f = fixture();
        f.account("a", true).await;
        f.account("b", false).await;
        f.issue("a", "12345678").await;
        f.engine.connect(&"b".into(), "12345678").await.unwrap();
        let mut sub = f.bus.subscribe(EventFilter::for_recipient("a".into()));

        let outcome = f.engine.disconnect(&"b".into()).await.unwrap();
        assert_eq!(outcome.former_partner_id, AccountId::from("a"));
        assert_eq!(outcome.released_codes, vec!["12345678".to_string()]);

        let (a, b) = (f.load("a"), f.load("b"));
        assert!(a.partner_id.is_none());
        assert!(b.partner_id.is_none());
        assert!(a.is_direct());
        assert_eq!(b.subscription_type, SubscriptionType::None);
        assert!(a.active_pairing_code.is_none());
        assert!(f.store.get::<InheritanceGrant>("a").unwrap().is_none());

        let code: PairingCode = f.store.get("12345678").unwrap().unwrap();
        assert!(!code.is_active);
        assert!(code.connected_partner_id.is_none());

        assert!(matches!(
            sub.try_recv().unwrap(),
            Some(PartnerEvent::PartnerDisconnected { .. })
        ));
    }

    #[tokio::test]
    async fn test_disconnect_without_partner() {
        let f = fixture();
        f.account("a", false).await;
        assert_eq!(
            f.engine.disconnect(&"a".into()).await,
            Err(ConnectionError::NoPartner)
        );
    }

    #[tokio::test]
    async fn test_disconnect_from_deleted_partner() {
        let f = fixture();
        f.account("b", false).await;
        let mut b = f.load("b");
        b.partner_id = Some("gone".into());
        b.grant_inherited("gone".into(), f.clock.now());
        f.store.upsert(&b).await.unwrap();

        f.engine.disconnect(&"b".into()).await.unwrap();
        let b = f.load("b");
        assert!(b.partner_id.is_none());
        assert_eq!(b.subscription_type, SubscriptionType::None);
        assert_eq!(f.bus.events_published(), 0);
    }

    #[tokio::test]
    async fn test_acknowledge_and_status() {
        let f = fixture();
        f.account("a", false).await;
        f.account("b", false).await;
        f.issue("a", "12345678").await;
        f.engine.connect(&"b".into(), "12345678").await.unwrap();

        assert!(f.engine.pairing_status(&"a".into()).unwrap().has_unseen_connection);
        f.engine.acknowledge_connection(&"a".into()).await.unwrap();
        let status = f.engine.pairing_status(&"a".into()).unwrap();
        assert!(!status.has_unseen_connection);
        assert_eq!(status.partner_id, Some("b".into()));

        assert_eq!(
            f.engine.pairing_status(&"ghost".into()),
            Err(ConnectionError::AccountMissing)
        );
    }
}
