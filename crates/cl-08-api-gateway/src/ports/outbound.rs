//! Outbound ports.

use async_trait::async_trait;
use shared_types::entities::AccountId;

/// Caller identity resolved from a trusted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Account the token belongs to.
    pub account_id: AccountId,
    /// Name carried by the identity provider, copied onto new accounts.
    pub display_name: Option<String>,
}

/// Turns a bearer token into a caller identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` for unknown, expired or revoked tokens.
    async fn resolve(&self, token: &str) -> Option<Identity>;
}
