//! # Gateway Service
//!
//! One method per remote operation. Caller operations authenticate first,
//! make sure the caller's account document exists, pass the rate gate and
//! only then reach a subsystem.

use crate::domain::{
    AdminRequest, ApiError, ApiOperation, CodeRequest, DisconnectResponse, GatewayConfig,
    GatewayError, OkResponse, SweepResponse, SyncRequest, ValidateResponse,
};
use crate::middleware::admin_secret_matches;
use crate::ports::{Identity, IdentityProvider};
use cl_01_document_store::{Store, StoreError};
use cl_02_rate_limiter::RateLimiter;
use cl_03_pairing_codes::{IssuedCode, PairingCodeRegistry};
use cl_04_subscription_inheritance::{EntitlementSync, SyncOutcome};
use cl_05_connection_engine::{ConnectOutcome, ConnectionTransactionEngine, PairingStatus};
use cl_06_orphan_auditor::{CleanupReport, DiagnosisReport, OrphanAuditor};
use cl_07_account_deletion::AccountDeletionCoordinator;
use shared_types::entities::Account;
use shared_types::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The subsystem services the gateway fronts.
#[derive(Clone)]
pub struct Subsystems {
    /// Per-account call guard.
    pub limiter: Arc<RateLimiter>,
    /// Pairing code issue and validation.
    pub codes: Arc<PairingCodeRegistry>,
    /// Connect, disconnect, acknowledge and status.
    pub connections: Arc<ConnectionTransactionEngine>,
    /// Purchase verification path.
    pub entitlements: Arc<EntitlementSync>,
    /// Orphan diagnosis and repair.
    pub auditor: Arc<OrphanAuditor>,
    /// Account removal.
    pub deletion: Arc<AccountDeletionCoordinator>,
}

/// Authenticated facade over every subsystem.
pub struct GatewayService {
    store: Store,
    clock: Arc<dyn Clock>,
    identity: Arc<dyn IdentityProvider>,
    subsystems: Subsystems,
    config: GatewayConfig,
}

impl GatewayService {
    /// Create the facade.
    pub fn new(
        store: Store,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityProvider>,
        subsystems: Subsystems,
        config: GatewayConfig,
    ) -> Self {
        Self {
            store,
            clock,
            identity,
            subsystems,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Resolve the bearer token to a caller.
    ///
    /// Runs before anything else on every caller operation.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Identity, ApiError> {
        let Some(token) = token else {
            debug!("Request without bearer token");
            return Err(GatewayError::Unauthenticated.into());
        };
        let Some(identity) = self.identity.resolve(token).await else {
            warn!("Bearer token did not resolve");
            return Err(GatewayError::Unauthenticated.into());
        };
        if self.config.auto_provision {
            self.ensure_account(&identity).await?;
        }
        Ok(identity)
    }

    async fn ensure_account(&self, identity: &Identity) -> Result<(), StoreError> {
        if self
            .store
            .get::<Account>(identity.account_id.as_str())?
            .is_some()
        {
            return Ok(());
        }

        let now = self.clock.now();
        let created = self
            .store
            .run_transaction(|tx| {
                if tx.get::<Account>(identity.account_id.as_str())?.is_some() {
                    return Ok(false);
                }
                tx.create(&Account::new(
                    identity.account_id.clone(),
                    identity.display_name.clone(),
                    now,
                ))?;
                Ok::<_, StoreError>(true)
            })
            .await?;
        if created {
            info!(account = %identity.account_id, "Account provisioned");
        }
        Ok(())
    }

    async fn gate(&self, caller: &Identity, operation: ApiOperation) -> Result<(), ApiError> {
        if let Some(guarded) = operation.rate_limited_as() {
            self.subsystems
                .limiter
                .enforce(&caller.account_id, guarded)
                .await?;
        }
        Ok(())
    }

    fn authorize_admin(&self, operation: ApiOperation, request: &AdminRequest) -> Result<(), ApiError> {
        if admin_secret_matches(&request.admin_secret, &self.config.admin_secret) {
            info!(operation = %operation, "Operator call authorized");
            Ok(())
        } else {
            warn!(operation = %operation, "Operator secret rejected");
            Err(GatewayError::PermissionDenied.into())
        }
    }

    /// `issuePairingCode`.
    pub async fn issue_pairing_code(&self, caller: &Identity) -> Result<IssuedCode, ApiError> {
        self.gate(caller, ApiOperation::IssuePairingCode).await?;
        Ok(self.subsystems.codes.issue_code(&caller.account_id).await?)
    }

    /// `validatePairingCode`. Rejections come back in-band.
    pub async fn validate_pairing_code(
        &self,
        caller: &Identity,
        request: CodeRequest,
    ) -> Result<ValidateResponse, ApiError> {
        self.gate(caller, ApiOperation::ValidatePairingCode).await?;
        match self
            .subsystems
            .codes
            .validate_code(&request.code, &caller.account_id)
            .await
        {
            Ok(validated) => Ok(validated.into()),
            Err(rejection) if rejection.is_rejection() => {
                Ok(ValidateResponse::rejected(&rejection))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `connectToPartner`.
    pub async fn connect_to_partner(
        &self,
        caller: &Identity,
        request: CodeRequest,
    ) -> Result<ConnectOutcome, ApiError> {
        self.gate(caller, ApiOperation::ConnectToPartner).await?;
        Ok(self
            .subsystems
            .connections
            .connect(&caller.account_id, &request.code)
            .await?)
    }

    /// `disconnectPartner`.
    pub async fn disconnect_partner(
        &self,
        caller: &Identity,
    ) -> Result<DisconnectResponse, ApiError> {
        self.gate(caller, ApiOperation::DisconnectPartner).await?;
        let outcome = self
            .subsystems
            .connections
            .disconnect(&caller.account_id)
            .await?;
        Ok(DisconnectResponse {
            ok: true,
            former_partner_id: outcome.former_partner_id,
        })
    }

    /// `deleteAccount`.
    pub async fn delete_account(&self, caller: &Identity) -> Result<OkResponse, ApiError> {
        self.gate(caller, ApiOperation::DeleteAccount).await?;
        let report = self
            .subsystems
            .deletion
            .delete_account(&caller.account_id)
            .await?;
        if !report.skipped_stages.is_empty() {
            warn!(account = %caller.account_id, skipped = ?report.skipped_stages, "Account deleted with skipped stages");
        }
        Ok(OkResponse::OK)
    }

    /// `syncSubscription`.
    pub async fn sync_subscription(
        &self,
        caller: &Identity,
        request: SyncRequest,
    ) -> Result<SyncOutcome, ApiError> {
        self.gate(caller, ApiOperation::SyncSubscription).await?;
        Ok(self
            .subsystems
            .entitlements
            .sync_subscription(&caller.account_id, request.receipt.as_deref())
            .await?)
    }

    /// `acknowledgeConnection`.
    pub async fn acknowledge_connection(&self, caller: &Identity) -> Result<OkResponse, ApiError> {
        self.subsystems
            .connections
            .acknowledge_connection(&caller.account_id)
            .await?;
        Ok(OkResponse::OK)
    }

    /// `getPairingStatus`.
    pub fn pairing_status(&self, caller: &Identity) -> Result<PairingStatus, ApiError> {
        Ok(self.subsystems.connections.pairing_status(&caller.account_id)?)
    }

    /// `diagnoseOrphans`.
    pub fn diagnose_orphans(&self, request: &AdminRequest) -> Result<DiagnosisReport, ApiError> {
        self.authorize_admin(ApiOperation::DiagnoseOrphans, request)?;
        Ok(self.subsystems.auditor.diagnose()?)
    }

    /// `cleanupOrphans`.
    pub async fn cleanup_orphans(&self, request: &AdminRequest) -> Result<CleanupReport, ApiError> {
        self.authorize_admin(ApiOperation::CleanupOrphans, request)?;
        Ok(self.subsystems.auditor.cleanup().await?)
    }

    /// `sweepRateLimits`.
    pub async fn sweep_rate_limits(&self, request: &AdminRequest) -> Result<SweepResponse, ApiError> {
        self.authorize_admin(ApiOperation::SweepRateLimits, request)?;
        let retention = chrono::Duration::hours(self.config.sweep_retention_hours);
        let removed_count = self.subsystems.limiter.sweep_expired(retention).await?;
        Ok(SweepResponse { removed_count })
    }
}
