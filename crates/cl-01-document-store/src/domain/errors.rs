//! # Domain Errors
//!
//! Error types for the document store.

use super::entities::DocumentKey;
use shared_types::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Store error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A document read by the transaction changed before commit.
    #[error("Write conflict on {key}")]
    Conflict {
        /// Document that moved.
        key: DocumentKey,
    },

    /// Every attempt lost to a concurrent writer.
    #[error("Transaction aborted after {attempts} conflicting attempts")]
    Contention {
        /// Attempts made.
        attempts: u32,
    },

    /// `create` targeted a document that already exists.
    #[error("Document already exists: {key}")]
    AlreadyExists {
        /// Existing document.
        key: DocumentKey,
    },

    /// The backend cannot be reached.
    #[error("Document store unavailable")]
    Unavailable,

    /// A stored document does not match its schema.
    #[error("Corrupt document {key}: {reason}")]
    Corrupt {
        /// Offending document.
        key: DocumentKey,
        /// Decoder message.
        reason: String,
    },

    /// A document could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether the transaction should be re-run against fresh reads.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Coarse category for client mapping.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

impl ClassifiedError for StoreError {
    fn kind(&self) -> ErrorKind {
        StoreError::kind(self)
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::Unavailable => "store-unavailable",
            Self::Contention { .. } | Self::Conflict { .. } => "contention",
            _ => "internal",
        }
    }
}
