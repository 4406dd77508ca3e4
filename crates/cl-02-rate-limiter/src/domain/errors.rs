//! Rate limiter errors.

use super::operation::Operation;
use cl_01_document_store::StoreError;
use shared_types::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Rate limiter error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateLimitError {
    /// Too many calls in the current window.
    #[error("Rate limit exceeded for {operation}, retry in {retry_after_secs}s")]
    Exceeded {
        /// Guarded operation.
        operation: Operation,
        /// Seconds until the next window.
        retry_after_secs: u64,
    },

    /// Counter store failure under `FailurePolicy::Strict`.
    #[error("Rate limit store error: {0}")]
    Store(#[from] StoreError),
}

impl ClassifiedError for RateLimitError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Exceeded { .. } => ErrorKind::ResourceExhausted,
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::Exceeded { .. } => "rate-limited",
            Self::Store(e) => e.reason(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exceeded_is_resource_exhausted() {
        let err = RateLimitError::Exceeded {
            operation: Operation::Connect,
            retry_after_secs: 12,
        };
        assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
        assert_eq!(err.reason(), "rate-limited");
        assert!(err.to_string().contains("connect"));
    }
}
