//! Auditor errors.

use cl_01_document_store::StoreError;
use shared_types::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Orphan auditor error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuditError {
    /// Store failure while scanning or repairing.
    #[error("Orphan audit store error: {0}")]
    Store(#[from] StoreError),
}

impl ClassifiedError for AuditError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::Store(e) => e.reason(),
        }
    }
}
