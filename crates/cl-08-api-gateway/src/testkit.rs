//! Fully wired gateway over in-memory adapters.

use crate::adapters::StaticTokenIdentity;
use crate::domain::GatewayConfig;
use crate::service::{GatewayService, Subsystems};
use cl_01_document_store::{InMemoryDocumentStore, Store};
use cl_02_rate_limiter::{RateLimiter, RateLimiterConfig};
use cl_03_pairing_codes::{PairingCodeConfig, PairingCodeRegistry, SequenceCodeSource};
use cl_04_subscription_inheritance::{EntitlementSync, StaticEntitlementVerifier};
use cl_05_connection_engine::{ConnectionConfig, ConnectionTransactionEngine};
use cl_06_orphan_auditor::OrphanAuditor;
use cl_07_account_deletion::{AccountDeletionCoordinator, DeletionConfig};
use shared_bus::InMemoryEventBus;
use shared_types::ManualClock;
use std::sync::Arc;

pub(crate) const ADMIN_SECRET: &str = "operator-secret";

pub(crate) struct Harness {
    pub service: Arc<GatewayService>,
    pub store: Store,
    pub backend: Arc<InMemoryDocumentStore>,
    pub verifier: Arc<StaticEntitlementVerifier>,
}

impl Harness {
    pub fn new() -> Self {
        let (store, backend) = Store::in_memory();
        let clock = Arc::new(ManualClock::at_unix(1_700_000_010));
        let events = Arc::new(InMemoryEventBus::new());
        let identity = Arc::new(StaticTokenIdentity::from_token_list(
            "tok-a=alice:Alice,tok-b=bob:Bob,tok-c=carol",
        ));
        let verifier = Arc::new(StaticEntitlementVerifier::new());

        let codes = Arc::new(PairingCodeRegistry::new(
            store.clone(),
            clock.clone(),
            Arc::new(SequenceCodeSource::new(["12345678", "87654321"])),
            PairingCodeConfig::default(),
        ));
        let subsystems = Subsystems {
            limiter: Arc::new(RateLimiter::new(
                store.clone(),
                clock.clone(),
                RateLimiterConfig::default(),
            )),
            codes: codes.clone(),
            connections: Arc::new(ConnectionTransactionEngine::new(
                store.clone(),
                clock.clone(),
                codes,
                events.clone(),
                ConnectionConfig::default(),
            )),
            entitlements: Arc::new(EntitlementSync::new(
                store.clone(),
                clock.clone(),
                verifier.clone(),
                events.clone(),
            )),
            auditor: Arc::new(OrphanAuditor::new(
                store.clone(),
                clock.clone(),
                events.clone(),
            )),
            deletion: Arc::new(AccountDeletionCoordinator::new(
                store.clone(),
                clock.clone(),
                identity.clone(),
                events,
                DeletionConfig::default(),
            )),
        };

        let config = GatewayConfig {
            admin_secret: ADMIN_SECRET.to_string(),
            ..GatewayConfig::default()
        };
        let service = Arc::new(GatewayService::new(
            store.clone(),
            clock,
            identity,
            subsystems,
            config,
        ));

        Self {
            service,
            store,
            backend,
            verifier,
        }
    }
}
