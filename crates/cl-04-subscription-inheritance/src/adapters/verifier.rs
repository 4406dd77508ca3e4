//! In-process `EntitlementVerifier`.

use crate::ports::{EntitlementVerifier, VerifierError};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::entities::AccountId;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Verifier backed by an explicit set of paying accounts.
///
/// Used by tests and by deployments that receive purchase state from a
/// billing webhook rather than validating receipts inline.
#[derive(Debug)]
pub struct StaticEntitlementVerifier {
    paying: RwLock<HashSet<AccountId>>,
    available: AtomicBool,
}

impl Default for StaticEntitlementVerifier {
    fn default() -> Self {
        Self {
            paying: RwLock::new(HashSet::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl StaticEntitlementVerifier {
    /// Verifier where nobody is paying.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `account` as holding a valid purchase.
    pub fn grant(&self, account: impl Into<AccountId>) {
        self.paying.write().insert(account.into());
    }

    /// Mark `account`'s purchase as lapsed.
    pub fn revoke(&self, account: &AccountId) {
        self.paying.write().remove(account);
    }

    /// Simulate a provider outage.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntitlementVerifier for StaticEntitlementVerifier {
    async fn purchase_is_valid(
        &self,
        account: &AccountId,
        _proof: Option<&str>,
    ) -> Result<bool, VerifierError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(VerifierError::Unavailable);
        }
        Ok(self.paying.read().contains(account))
    }
}
