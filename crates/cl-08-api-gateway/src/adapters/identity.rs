//! Token table identity provider.

use crate::ports::{Identity, IdentityProvider};
use async_trait::async_trait;
use cl_07_account_deletion::{AuthDirectory, DirectoryError};
use parking_lot::RwLock;
use shared_types::entities::AccountId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fixed token to identity table held in process.
///
/// Also serves as the deletion `AuthDirectory`: removing an identity revokes
/// every token that resolved to it.
#[derive(Debug)]
pub struct StaticTokenIdentity {
    tokens: RwLock<HashMap<String, Identity>>,
    available: AtomicBool,
}

impl Default for StaticTokenIdentity {
    fn default() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl StaticTokenIdentity {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `token` to `account`.
    pub fn register(
        &self,
        token: impl Into<String>,
        account: impl Into<AccountId>,
        display_name: Option<&str>,
    ) {
        self.tokens.write().insert(
            token.into(),
            Identity {
                account_id: account.into(),
                display_name: display_name.map(str::to_string),
            },
        );
    }

    /// Parse `token=account[:name]` entries separated by commas.
    ///
    /// Malformed entries are skipped.
    #[must_use]
    pub fn from_token_list(list: &str) -> Self {
        let table = Self::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((token, rest)) = entry.split_once('=') else {
                tracing::warn!(entry, "Skipping malformed identity entry");
                continue;
            };
            let (account, name) = match rest.split_once(':') {
                Some((account, name)) => (account, Some(name)),
                None => (rest, None),
            };
            if token.is_empty() || account.is_empty() {
                tracing::warn!(entry, "Skipping malformed identity entry");
                continue;
            }
            table.register(token, account, name);
        }
        table
    }

    /// Number of live tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    /// Whether no tokens are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }

    /// Simulate a directory outage for deletion.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenIdentity {
    async fn resolve(&self, token: &str) -> Option<Identity> {
        self.tokens.read().get(token).cloned()
    }
}

#[async_trait]
impl AuthDirectory for StaticTokenIdentity {
    async fn remove_identity(&self, account: &AccountId) -> Result<(), DirectoryError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable);
        }
        self.tokens
            .write()
            .retain(|_, identity| &identity.account_id != account);
        Ok(())
    }
}
