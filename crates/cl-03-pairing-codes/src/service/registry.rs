//! # Pairing Code Registry
//!
//! Issue and validate operations. Every mutation is one store transaction.

use super::lifecycle::check_code;
use crate::domain::{normalize_code, IssuedCode, PairingCodeConfig, PairingError, ValidatedCode};
use crate::ports::CodeSource;
use cl_01_document_store::Store;
use shared_types::entities::{Account, AccountId, DeactivationReason, PairingCode};
use shared_types::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

enum Issue {
    Issued(IssuedCode),
    Collision,
}

/// Pairing code registry.
pub struct PairingCodeRegistry {
    store: Store,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeSource>,
    config: PairingCodeConfig,
}

impl PairingCodeRegistry {
    /// Create a registry.
    pub fn new(
        store: Store,
        clock: Arc<dyn Clock>,
        codes: Arc<dyn CodeSource>,
        config: PairingCodeConfig,
    ) -> Self {
        Self {
            store,
            clock,
            codes,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PairingCodeConfig {
        &self.config
    }

    /// Canonicalize a client token with the configured length.
    pub fn normalize(&self, raw: &str) -> Result<String, PairingError> {
        normalize_code(raw, self.config.code_length)
    }

    /// Return the owner's open code, or mint a new one.
    ///
    /// An owner who currently has a partner cannot issue a code. A stale code
    /// the owner still points at is retired in the same transaction that
    /// mints its replacement.
    pub async fn issue_code(&self, owner_id: &AccountId) -> Result<IssuedCode, PairingError> {
        let attempts = self.config.max_generation_attempts.max(1);

        for attempt in 1..=attempts {
            let candidate = self.codes.next_code(self.config.code_length);
            let now = self.clock.now();
            let ttl = self.config.ttl;

            let outcome = self
                .store
                .run_transaction(|tx| {
                    let Some(mut owner) = tx.get::<Account>(owner_id.as_str())? else {
                        return Err(PairingError::AccountMissing);
                    };
                    if owner.partner_id.is_some() {
                        return Err(PairingError::AlreadyConnected);
                    }

                    if let Some(current) = owner.active_pairing_code.clone() {
                        match tx.get::<PairingCode>(&current)? {
                            Some(code) if code.owner_id == owner.id && code.is_open(now) => {
                                return Ok(Issue::Issued(IssuedCode {
                                    code: code.code,
                                    expires_at: code.expires_at,
                                    reused: true,
                                }));
                            }
                            Some(mut code) if code.owner_id == owner.id && code.is_active => {
                                let reason = if code.is_expired(now) {
                                    DeactivationReason::Expired
                                } else {
                                    DeactivationReason::Superseded
                                };
                                code.deactivate(reason, now);
                                tx.set(&code)?;
                            }
                            _ => {}
                        }
                    }

                    if tx.get::<PairingCode>(&candidate)?.is_some() {
                        return Ok(Issue::Collision);
                    }

                    let code = PairingCode::issue(candidate.clone(), owner.id.clone(), now, ttl);
                    tx.create(&code)?;
                    owner.active_pairing_code = Some(candidate.clone());
                    tx.set(&owner)?;

                    Ok(Issue::Issued(IssuedCode {
                        code: code.code,
                        expires_at: code.expires_at,
                        reused: false,
                    }))
                })
                .await?;

            match outcome {
                Issue::Issued(issued) => {
                    if issued.reused {
                        debug!(owner = %owner_id, "Returning existing pairing code");
                    } else {
                        info!(owner = %owner_id, expires_at = %issued.expires_at, "Pairing code issued");
                    }
                    return Ok(issued);
                }
                Issue::Collision => {
                    debug!(owner = %owner_id, attempt, "Pairing code collision");
                    if let Some(pause) = self.config.collision_backoff {
                        tokio::time::sleep(pause).await;
                    }
                }
            }
        }

        warn!(owner = %owner_id, attempts, "Pairing code generation exhausted");
        Err(PairingError::GenerationExhausted { attempts })
    }

    /// Check whether `requester_id` could connect through `raw_code`.
    ///
    /// An expired code, or one whose owner no longer exists, is retired as a
    /// side effect even though the call reports a rejection.
    pub async fn validate_code(
        &self,
        raw_code: &str,
        requester_id: &AccountId,
    ) -> Result<ValidatedCode, PairingError> {
        let token = self.normalize(raw_code)?;
        let now = self.clock.now();

        let verdict = self
            .store
            .run_transaction(|tx| {
                let verdict = check_code(tx, &token, requester_id, now)?;
                let heal = match &verdict {
                    Err(PairingError::Expired) => Some(DeactivationReason::Expired),
                    Err(PairingError::OwnerMissing) => Some(DeactivationReason::OwnerMissing),
                    _ => None,
                };
                if let Some(reason) = heal {
                    if let Some(mut code) = tx.get::<PairingCode>(&token)? {
                        code.deactivate(reason, now);
                        tx.set(&code)?;
                    }
                }
                Ok::<_, PairingError>(verdict)
            })
            .await?;

        match verdict {
            Ok(checked) => {
                debug!(code = %token, requester = %requester_id, "Pairing code valid");
                Ok(ValidatedCode {
                    code: checked.code.code,
                    owner_id: checked.owner.id,
                    owner_name: checked.owner.display_name,
                    expires_at: checked.code.expires_at,
                })
            }
            Err(rejection) => {
                if matches!(rejection, PairingError::Expired | PairingError::OwnerMissing) {
                    warn!(code = %token, reason = %rejection, "Retired pairing code on read");
                } else {
                    debug!(code = %token, requester = %requester_id, reason = %rejection, "Pairing code rejected");
                }
                Err(rejection)
            }
        }
    }

    /// Read a code without side effects.
    pub fn get_code(&self, raw_code: &str) -> Result<Option<PairingCode>, PairingError> {
        let token = self.normalize(raw_code)?;
        Ok(self.store.get::<PairingCode>(&token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SequenceCodeSource;
    use chrono::Duration;
    use cl_01_document_store::InMemoryDocumentStore;
    use shared_types::ManualClock;

    const DEFAULT_ATTEMPTS: u32 = crate::domain::DEFAULT_MAX_GENERATION_ATTEMPTS;

    struct Fixture {
        registry: PairingCodeRegistry,
        store: Store,
        clock: Arc<ManualClock>,
        codes: Arc<SequenceCodeSource>,
        backend: Arc<InMemoryDocumentStore>,
    }

    fn fixture() -> Fixture {
        let (store, backend) = Store::in_memory();
        let clock = Arc::new(ManualClock::at_unix(1_700_000_000));
        let codes = Arc::new(SequenceCodeSource::default());
        let config = PairingCodeConfig {
            collision_backoff: None,
            ..PairingCodeConfig::default()
        };
        let registry =
            PairingCodeRegistry::new(store.clone(), clock.clone(), codes.clone(), config);
        Fixture {
            registry,
            store,
            clock,
            codes,
            backend,
        }
    }

    async fn seed(f: &Fixture, id: &str, name: &str) {
        f.store
            .upsert(&Account::new(id, Some(name.to_string()), f.clock.now()))
            .await
            .unwrap();
    }

    fn id(raw: &str) -> AccountId {
        AccountId::from(raw)
    }

    #[tokio::test]
    async fn test_issue_is_idempotent() {
        let f = fixture();
        seed(&f, "a", "Ana").await;
        f.codes.push("12345678");
        f.codes.push("87654321");

        let first = f.registry.issue_code(&id("a")).await.unwrap();
        let second = f.registry.issue_code(&id("a")).await.unwrap();

        assert_eq!(first.code, "12345678");
        assert_eq!(second.code, "12345678");
        assert!(second.reused);
    }

    #[tokio::test]
    async fn test_issue_retries_on_collision() {
        let f = fixture();
        seed(&f, "a", "Ana").await;
        seed(&f, "b", "Ben").await;
        f.codes.push("11111111");
        f.codes.push("11111111");
        f.codes.push("22222222");

        f.registry.issue_code(&id("a")).await.unwrap();
        let issued = f.registry.issue_code(&id("b")).await.unwrap();

        assert_eq!(issued.code, "22222222");
    }

    #[tokio::test]
    async fn test_issue_gives_up_after_bounded_attempts() {
        let f = fixture();
        seed(&f, "a", "Ana").await;
        seed(&f, "b", "Ben").await;
        f.codes.push("11111111");
        f.registry.issue_code(&id("a")).await.unwrap();
        for _ in 0..DEFAULT_ATTEMPTS {
            f.codes.push("11111111");
        }

        let err = f.registry.issue_code(&id("b")).await.unwrap_err();
        assert_eq!(err, PairingError::GenerationExhausted { attempts: DEFAULT_ATTEMPTS });
    }


    #[tokio::test]
    async fn test_expired_code_replaced_on_issue() {
        let f = fixture();
        seed(&f, "a", "Ana").await;
        f.codes.push("12345678");
        f.codes.push("87654321");

        f.registry.issue_code(&id("a")).await.unwrap();
        f.clock.advance(Duration::hours(25));
        let fresh = f.registry.issue_code(&id("a")).await.unwrap();

        assert_eq!(fresh.code, "87654321");
        let old: PairingCode = f.store.get("12345678").unwrap().unwrap();
        assert!(!old.is_active);
        assert_eq!(old.deactivation_reason, Some(DeactivationReason::Expired));
    }

    #[tokio::test]
    async fn test_paired_owner_cannot_issue() {
        let f = fixture();
        let mut a = Account::new("a", None, f.clock.now());
        a.partner_id = Some(id("b"));
        f.store.upsert(&a).await.unwrap();

        let err = f.registry.issue_code(&id("a")).await.unwrap_err();
        assert_eq!(err, PairingError::AlreadyConnected);
    }

    #[tokio::test]
    async fn test_validate_returns_owner() {
        let f = fixture();
        seed(&f, "a", "Ana").await;
        seed(&f, "b", "Ben").await;
        f.codes.push("12345678");
        f.registry.issue_code(&id("a")).await.unwrap();

        let valid = f.registry.validate_code("12345678", &id("b")).await.unwrap();
        assert_eq!(valid.owner_id, id("a"));
        assert_eq!(valid.owner_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_expired_code_self_heals_on_validate() {
        let f = fixture();
        seed(&f, "a", "Ana").await;
        seed(&f, "b", "Ben").await;
        f.codes.push("12345678");
        f.registry.issue_code(&id("a")).await.unwrap();
        f.clock.advance(Duration::hours(24));

        let err = f.registry.validate_code("12345678", &id("b")).await.unwrap_err();
        assert_eq!(err, PairingError::Expired);

        let code: PairingCode = f.store.get("12345678").unwrap().unwrap();
        assert!(!code.is_active);

        // Repeat is harmless and reports the retired state.
        let again = f.registry.validate_code("12345678", &id("b")).await.unwrap_err();
        assert_eq!(again, PairingError::Inactive);
    }

    #[tokio::test]
    async fn test_orphaned_code_self_heals_on_validate() {
        let f = fixture();
        seed(&f, "b", "Ben").await;
        let code = PairingCode::issue("12345678".into(), id("ghost"), f.clock.now(), Duration::hours(1));
        f.store.upsert(&code).await.unwrap();

        let err = f.registry.validate_code("12345678", &id("b")).await.unwrap_err();
        assert_eq!(err, PairingError::OwnerMissing);

        let code: PairingCode = f.store.get("12345678").unwrap().unwrap();
        assert_eq!(code.deactivation_reason, Some(DeactivationReason::OwnerMissing));
    }

    #[tokio::test]
    async fn test_validate_rejections() {
        let f = fixture();
        seed(&f, "a", "Ana").await;
        f.codes.push("12345678");
        f.registry.issue_code(&id("a")).await.unwrap();

        assert_eq!(
            f.registry.validate_code("99999999", &id("a")).await.unwrap_err(),
            PairingError::NotFound
        );
        assert_eq!(
            f.registry.validate_code("12345678", &id("a")).await.unwrap_err(),
            PairingError::SelfConnection
        );
        assert_eq!(
            f.registry.validate_code("12-34", &id("a")).await.unwrap_err(),
            PairingError::InvalidCode
        );
    }

    #[tokio::test]
    async fn test_store_outage_is_internal() {
        let f = fixture();
        f.backend.set_available(false);

        let err = f.registry.validate_code("12345678", &id("b")).await.unwrap_err();
        assert!(matches!(err, PairingError::Store(_)));
        assert!(!err.is_rejection());
    }
}
