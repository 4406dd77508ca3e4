//! Inheritance errors.

use crate::ports::VerifierError;
use cl_01_document_store::StoreError;
use shared_types::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Subscription inheritance error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InheritanceError {
    /// The caller's account document does not exist.
    #[error("Account not found")]
    AccountMissing,

    /// The purchase verifier could not answer.
    #[error("Entitlement verification failed: {0}")]
    Verifier(#[from] VerifierError),

    /// Store failure.
    #[error("Inheritance store error: {0}")]
    Store(#[from] StoreError),
}

impl ClassifiedError for InheritanceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountMissing => ErrorKind::NotFound,
            Self::Verifier(_) | Self::Store(_) => ErrorKind::Internal,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::AccountMissing => "account-missing",
            Self::Verifier(_) => "verifier-unavailable",
            Self::Store(e) => e.reason(),
        }
    }
}
