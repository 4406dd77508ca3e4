//! Connection engine errors.

use cl_01_document_store::StoreError;
use cl_03_pairing_codes::PairingError;
use shared_types::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Connection engine error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    /// The code was rejected.
    #[error(transparent)]
    Rejected(#[from] PairingError),

    /// Disconnect was called by an account without a partner.
    #[error("Caller has no partner")]
    NoPartner,

    /// The caller's account document does not exist.
    #[error("Account not found")]
    AccountMissing,

    /// Store failure.
    #[error("Connection store error: {0}")]
    Store(#[from] StoreError),
}

impl ClassifiedError for ConnectionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Rejected(e) => e.kind(),
            Self::NoPartner | Self::AccountMissing => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::Rejected(e) => e.reason(),
            Self::NoPartner => "no-partner",
            Self::AccountMissing => "account-missing",
            Self::Store(e) => e.reason(),
        }
    }
}
