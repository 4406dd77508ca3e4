//! # Domain Errors
//!
//! Pairing code rejections and failures.

use cl_01_document_store::StoreError;
use shared_types::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Pairing code error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PairingError {
    /// No code with this token.
    #[error("Pairing code not found")]
    NotFound,

    /// The code was retired.
    #[error("Pairing code is no longer active")]
    Inactive,

    /// The code passed its expiry and has been retired.
    #[error("Pairing code expired")]
    Expired,

    /// The requester owns the code.
    #[error("Cannot connect to your own pairing code")]
    SelfConnection,

    /// Consumed by another account, or the owner is paired elsewhere.
    #[error("Pairing code already used")]
    AlreadyUsed,

    /// The owner's account is gone; the code has been retired.
    #[error("Pairing code owner no longer exists")]
    OwnerMissing,

    /// The caller's own account document does not exist.
    #[error("Account not found")]
    AccountMissing,

    /// The caller already has a partner.
    #[error("Account is already connected to a partner")]
    AlreadyConnected,

    /// Malformed token.
    #[error("Invalid pairing code format")]
    InvalidCode,

    /// Every generated candidate collided.
    #[error("Could not generate a unique pairing code after {attempts} attempts")]
    GenerationExhausted {
        /// Candidates tried.
        attempts: u32,
    },

    /// Store failure.
    #[error("Pairing store error: {0}")]
    Store(#[from] StoreError),
}

impl PairingError {
    /// Whether this is a validation outcome the client renders, as opposed
    /// to a malformed request or infrastructure failure.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Self::InvalidCode | Self::GenerationExhausted { .. } | Self::Store(_)
        )
    }
}

impl ClassifiedError for PairingError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound | Self::Inactive | Self::OwnerMissing | Self::AccountMissing => {
                ErrorKind::NotFound
            }
            Self::Expired => ErrorKind::DeadlineExceeded,
            Self::SelfConnection | Self::InvalidCode => ErrorKind::InvalidArgument,
            Self::AlreadyUsed | Self::AlreadyConnected => ErrorKind::Conflict,
            Self::GenerationExhausted { .. } | Self::Store(_) => ErrorKind::Internal,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Inactive => "inactive",
            Self::Expired => "expired",
            Self::SelfConnection => "self",
            Self::AlreadyUsed => "already-used",
            Self::OwnerMissing => "owner-missing",
            Self::AccountMissing => "account-missing",
            Self::AlreadyConnected => "already-connected",
            Self::InvalidCode => "invalid-code",
            Self::GenerationExhausted { .. } => "internal",
            Self::Store(e) => e.reason(),
        }
    }
}
