//! # Outbound Ports
//!
//! App-store purchase verification, consumed as an opaque yes/no.

use async_trait::async_trait;
use shared_types::entities::AccountId;
use thiserror::Error;

/// Verifier failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifierError {
    /// The verification provider cannot be reached.
    #[error("verifier unavailable")]
    Unavailable,
    /// The proof could not be parsed.
    #[error("malformed entitlement proof: {0}")]
    MalformedProof(String),
}

/// Answers "is this caller's own purchase currently valid".
#[async_trait]
pub trait EntitlementVerifier: Send + Sync {
    /// Check the caller's purchase, optionally using a client-supplied proof.
    async fn purchase_is_valid(
        &self,
        account: &AccountId,
        proof: Option<&str>,
    ) -> Result<bool, VerifierError>;
}
