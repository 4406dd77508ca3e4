//! # Outbound Ports

use async_trait::async_trait;
use shared_types::entities::AccountId;
use thiserror::Error;

/// Authentication directory failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// The identity provider cannot be reached.
    #[error("auth directory unavailable")]
    Unavailable,
}

/// Removes the authentication identity behind an account.
#[async_trait]
pub trait AuthDirectory: Send + Sync {
    /// Remove `account`'s identity. Removing an unknown identity succeeds.
    async fn remove_identity(&self, account: &AccountId) -> Result<(), DirectoryError>;
}
