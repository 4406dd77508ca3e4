//! In-memory `AuthDirectory`.

use crate::ports::{AuthDirectory, DirectoryError};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::entities::AccountId;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Identity set held in process.
#[derive(Debug)]
pub struct InMemoryAuthDirectory {
    identities: RwLock<HashSet<AccountId>>,
    available: AtomicBool,
}

impl Default for InMemoryAuthDirectory {
    fn default() -> Self {
        Self {
            identities: RwLock::new(HashSet::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl InMemoryAuthDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identity.
    pub fn register(&self, account: impl Into<AccountId>) {
        self.identities.write().insert(account.into());
    }

    /// Whether `account` still has an identity.
    #[must_use]
    pub fn contains(&self, account: &AccountId) -> bool {
        self.identities.read().contains(account)
    }

    /// Simulate an outage.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthDirectory for InMemoryAuthDirectory {
    async fn remove_identity(&self, account: &AccountId) -> Result<(), DirectoryError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable);
        }
        self.identities.write().remove(account);
        Ok(())
    }
}
