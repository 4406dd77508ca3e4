//! Deletion errors.

use crate::ports::DirectoryError;
use cl_01_document_store::StoreError;
use shared_types::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Account deletion error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeletionError {
    /// No such account.
    #[error("Account not found")]
    NotFound,

    /// A secondary cleanup stage failed in strict mode.
    #[error("Deletion cleanup failed during {stage}: {source}")]
    Cleanup {
        /// Stage name.
        stage: &'static str,
        /// Underlying failure.
        source: StoreError,
    },

    /// The authentication identity could not be removed.
    #[error("Identity removal failed: {0}")]
    Identity(#[from] DirectoryError),

    /// Store failure.
    #[error("Deletion store error: {0}")]
    Store(#[from] StoreError),
}

impl ClassifiedError for DeletionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::Internal,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Store(e) | Self::Cleanup { source: e, .. } => e.reason(),
            Self::Identity(_) => "internal",
        }
    }
}
