//! # Test Fixtures
//!
//! A `World` wires every subsystem to one in-memory store, a manual clock
//! and one event bus, the same way the runtime container does.

use cl_01_document_store::{InMemoryDocumentStore, Store};
use cl_02_rate_limiter::{RateLimiter, RateLimiterConfig};
use cl_03_pairing_codes::{PairingCodeConfig, PairingCodeRegistry, SequenceCodeSource};
use cl_04_subscription_inheritance::{EntitlementSync, StaticEntitlementVerifier, SyncOutcome};
use cl_05_connection_engine::{ConnectionConfig, ConnectionTransactionEngine};
use cl_06_orphan_auditor::OrphanAuditor;
use cl_07_account_deletion::{AccountDeletionCoordinator, DeletionConfig, InMemoryAuthDirectory};
use shared_bus::InMemoryEventBus;
use shared_types::entities::{Account, AccountId, InheritanceGrant};
use shared_types::{Clock, ManualClock};
use std::collections::HashMap;
use std::sync::Arc;

/// Start of a 5-minute rate window.
pub const EPOCH: i64 = 1_700_000_100;

/// Every subsystem over shared in-memory infrastructure.
pub struct World {
    pub store: Store,
    pub backend: Arc<InMemoryDocumentStore>,
    pub clock: Arc<ManualClock>,
    pub bus: Arc<InMemoryEventBus>,
    pub directory: Arc<InMemoryAuthDirectory>,
    pub verifier: Arc<StaticEntitlementVerifier>,
    pub code_source: Arc<SequenceCodeSource>,
    pub limiter: Arc<RateLimiter>,
    pub codes: Arc<PairingCodeRegistry>,
    pub connections: Arc<ConnectionTransactionEngine>,
    pub entitlements: Arc<EntitlementSync>,
    pub auditor: Arc<OrphanAuditor>,
    pub deletion: Arc<AccountDeletionCoordinator>,
}

impl World {
    pub fn new() -> Self {
        Self::with_limits(RateLimiterConfig::default())
    }

    pub fn with_limits(limits: RateLimiterConfig) -> Self {
        let (store, backend) = Store::in_memory();
        let clock = Arc::new(ManualClock::at_unix(EPOCH));
        let bus = Arc::new(InMemoryEventBus::new());
        let directory = Arc::new(InMemoryAuthDirectory::new());
        let verifier = Arc::new(StaticEntitlementVerifier::new());
        let code_source = Arc::new(SequenceCodeSource::new(Vec::<String>::new()));

        let codes = Arc::new(PairingCodeRegistry::new(
            store.clone(),
            clock.clone(),
            code_source.clone(),
            PairingCodeConfig {
                collision_backoff: None,
                ..PairingCodeConfig::default()
            },
        ));

        Self {
            limiter: Arc::new(RateLimiter::new(store.clone(), clock.clone(), limits)),
            connections: Arc::new(ConnectionTransactionEngine::new(
                store.clone(),
                clock.clone(),
                codes.clone(),
                bus.clone(),
                ConnectionConfig::default(),
            )),
            entitlements: Arc::new(EntitlementSync::new(
                store.clone(),
                clock.clone(),
                verifier.clone(),
                bus.clone(),
            )),
            auditor: Arc::new(OrphanAuditor::new(store.clone(), clock.clone(), bus.clone())),
            deletion: Arc::new(AccountDeletionCoordinator::new(
                store.clone(),
                clock.clone(),
                directory.clone(),
                bus.clone(),
                DeletionConfig::default(),
            )),
            codes,
            store,
            backend,
            clock,
            bus,
            directory,
            verifier,
            code_source,
        }
    }

    /// Create the account (and its identity) unless it exists.
    pub async fn account(&self, id: &str) -> AccountId {
        let account_id = AccountId::from(id);
        if self.store.get::<Account>(id).unwrap().is_none() {
            let name = format!("{}{}", id[..1].to_uppercase(), &id[1..]);
            self.store
                .upsert(&Account::new(id, Some(name), self.clock.now()))
                .await
                .unwrap();
            self.directory.register(id);
        }
        account_id
    }

    /// Mark `id` as a paying subscriber and sync.
    pub async fn subscribe(&self, id: &str) -> SyncOutcome {
        self.verifier.grant(id);
        self.entitlements
            .sync_subscription(&AccountId::from(id), None)
            .await
            .unwrap()
    }

    pub fn get(&self, id: &str) -> Option<Account> {
        self.store.get::<Account>(id).unwrap()
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.store.scan::<Account>().unwrap()
    }

    /// Panic with a description of the first violated invariant.
    pub fn assert_invariants(&self) {
        let accounts = self.accounts();
        let grants = self.store.scan::<InheritanceGrant>().unwrap();
        if let Err(violation) = check_invariants(&accounts, &grants) {
            panic!("invariant violated: {violation}\naccounts: {accounts:#?}");
        }
    }
}

/// Pairing and entitlement invariants over a full snapshot.
pub fn check_invariants(accounts: &[Account], grants: &[InheritanceGrant]) -> Result<(), String> {
    let by_id: HashMap<&AccountId, &Account> = accounts.iter().map(|a| (&a.id, a)).collect();
    let grant_for: HashMap<&AccountId, &InheritanceGrant> =
        grants.iter().map(|g| (&g.source_id, g)).collect();
    let mut beneficiaries: HashMap<&AccountId, usize> = HashMap::new();

    for account in accounts {
        if let Some(partner_id) = &account.partner_id {
            match by_id.get(partner_id) {
                None => return Err(format!("{} points at missing partner {partner_id}", account.id)),
                Some(partner) if partner.partner_id.as_ref() != Some(&account.id) => {
                    return Err(format!(
                        "{} -> {partner_id} is not reciprocated ({:?})",
                        account.id, partner.partner_id
                    ))
                }
                Some(_) => {}
            }
        }

        if account.is_inherited() {
            let Some(source_id) = &account.subscription_source_account_id else {
                return Err(format!("{} is inherited without a source", account.id));
            };
            if account.partner_id.as_ref() != Some(source_id) {
                return Err(format!("{} inherits from non-partner {source_id}", account.id));
            }
            match by_id.get(source_id) {
                Some(source) if source.is_direct() => {}
                Some(_) => return Err(format!("{} inherits from non-direct {source_id}", account.id)),
                None => return Err(format!("{} inherits from missing {source_id}", account.id)),
            }
            match grant_for.get(source_id) {
                Some(grant) if grant.beneficiary_id == account.id => {}
                other => {
                    return Err(format!(
                        "{} has no matching grant from {source_id}: {other:?}",
                        account.id
                    ))
                }
            }
            *beneficiaries.entry(source_id).or_default() += 1;
        }
    }

    match beneficiaries.into_iter().find(|(_, n)| *n > 1) {
        Some((source, n)) => Err(format!("{source} has {n} beneficiaries")),
        None => Ok(()),
    }
}
