//! # Subsystem Container
//!
//! Holds all subsystem instances and wires them to shared infrastructure.
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: clock, event bus, document store, identity table, verifier
//! Level 1: RateLimiter, PairingCodeRegistry
//! Level 2: ConnectionTransactionEngine, EntitlementSync
//! Level 3: OrphanAuditor, AccountDeletionCoordinator
//! Level 4: GatewayService
//! ```
//!
//! Subsystems never call each other through the container; the gateway is
//! the only consumer of the assembled set.

use crate::container::config::NodeConfig;
use cl_01_document_store::{InMemoryDocumentStore, Store};
use cl_02_rate_limiter::RateLimiter;
use cl_03_pairing_codes::{PairingCodeRegistry, RandomCodeSource};
use cl_04_subscription_inheritance::{EntitlementSync, StaticEntitlementVerifier};
use cl_05_connection_engine::ConnectionTransactionEngine;
use cl_06_orphan_auditor::OrphanAuditor;
use cl_07_account_deletion::AccountDeletionCoordinator;
use cl_08_api_gateway::{GatewayService, StaticTokenIdentity, Subsystems};
use shared_bus::InMemoryEventBus;
use shared_types::{Clock, SystemClock};
use std::sync::Arc;
use tracing::info;

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    /// Configuration the container was built from.
    pub config: NodeConfig,

    // =========================================================================
    // SHARED INFRASTRUCTURE
    // =========================================================================
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Partner notification bus.
    pub event_bus: Arc<InMemoryEventBus>,
    /// Transactional document store.
    pub store: Store,
    /// Backend behind `store`.
    pub backend: Arc<InMemoryDocumentStore>,
    /// Token table, also the deletion auth directory.
    pub identity: Arc<StaticTokenIdentity>,
    /// Purchase verifier.
    pub verifier: Arc<StaticEntitlementVerifier>,

    // =========================================================================
    // SUBSYSTEMS
    // =========================================================================
    /// Subsystem services (rate limiter, codes, connections, entitlement,
    /// auditor, deletion).
    pub subsystems: Subsystems,
    /// Authenticated facade.
    pub gateway: Arc<GatewayService>,
}

impl SubsystemContainer {
    /// Build every subsystem from `config` on the system clock.
    pub fn new(config: NodeConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build every subsystem on an explicit clock.
    pub fn with_clock(config: NodeConfig, clock: Arc<dyn Clock>) -> Self {
        info!("Initializing CoupleLink subsystems");

        // Level 0
        let event_bus = Arc::new(InMemoryEventBus::new());
        let backend = Arc::new(InMemoryDocumentStore::new());
        let store = Store::new(backend.clone(), config.store.clone());
        let identity = Arc::new(StaticTokenIdentity::from_token_list(&config.seed.identity_tokens));
        let verifier = Arc::new(StaticEntitlementVerifier::new());
        for account in &config.seed.entitled_accounts {
            verifier.grant(account.as_str());
        }
        info!(
            tokens = identity.len(),
            entitled = config.seed.entitled_accounts.len(),
            "Identity and entitlement adapters ready"
        );

        // Level 1
        let limiter = Arc::new(RateLimiter::new(
            store.clone(),
            clock.clone(),
            config.rate_limit.clone(),
        ));
        let codes = Arc::new(PairingCodeRegistry::new(
            store.clone(),
            clock.clone(),
            Arc::new(RandomCodeSource),
            config.pairing.clone(),
        ));
        info!(mode = ?config.rate_limit.mode, failure_policy = ?config.rate_limit.failure_policy, "[cl-02] Rate limiter initialized");

        // Level 2
        let connections = Arc::new(ConnectionTransactionEngine::new(
            store.clone(),
            clock.clone(),
            codes.clone(),
            event_bus.clone(),
            config.connection.clone(),
        ));
        let entitlements = Arc::new(EntitlementSync::new(
            store.clone(),
            clock.clone(),
            verifier.clone(),
            event_bus.clone(),
        ));

        // Level 3
        let auditor = Arc::new(OrphanAuditor::new(
            store.clone(),
            clock.clone(),
            event_bus.clone(),
        ));
        let deletion = Arc::new(AccountDeletionCoordinator::new(
            store.clone(),
            clock.clone(),
            identity.clone(),
            event_bus.clone(),
            config.deletion.clone(),
        ));
        info!(mode = ?config.deletion.mode, "[cl-07] Account deletion initialized");

        // Level 4
        let subsystems = Subsystems {
            limiter,
            codes,
            connections,
            entitlements,
            auditor,
            deletion,
        };
        let gateway = Arc::new(GatewayService::new(
            store.clone(),
            clock.clone(),
            identity.clone(),
            subsystems.clone(),
            config.gateway.clone(),
        ));
        info!(admin_enabled = config.gateway.admin_enabled(), "[cl-08] Gateway initialized");

        Self {
            config,
            clock,
            event_bus,
            store,
            backend,
            identity,
            verifier,
            subsystems,
            gateway,
        }
    }
}
