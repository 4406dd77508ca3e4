//! Gateway error types.
//!
//! Every subsystem error reaches the client as an [`ApiError`]: a taxonomy
//! kind, a stable reason string and a message. Internal failures keep their
//! detail in the server log and show the caller a generic message.

use serde::Serialize;
use shared_types::{ClassifiedError, ErrorKind};
use std::fmt;
use thiserror::Error;

/// Message shown for every `Internal` error.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal error, please retry later";

/// Errors raised by the gateway itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Missing, malformed or unknown bearer token.
    #[error("Authentication required")]
    Unauthenticated,

    /// Admin call with a wrong or unconfigured secret.
    #[error("Operator secret rejected")]
    PermissionDenied,

    /// Body is not the JSON payload the operation expects.
    #[error("Invalid request payload: {0}")]
    InvalidPayload(String),

    /// No operation with this name.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// A response could not be encoded.
    #[error("Response encoding failed: {0}")]
    Encoding(String),
}

impl ClassifiedError for GatewayError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::InvalidPayload(_) => ErrorKind::InvalidArgument,
            Self::UnknownOperation(_) => ErrorKind::NotFound,
            Self::Encoding(_) => ErrorKind::Internal,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied => "permission-denied",
            Self::InvalidPayload(_) => "invalid-payload",
            Self::UnknownOperation(_) => "unknown-operation",
            Self::Encoding(_) => "internal",
        }
    }
}

/// Client-facing error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Taxonomy category.
    pub kind: ErrorKind,
    /// Stable machine reason.
    pub reason: &'static str,
    /// Human readable message.
    pub message: String,
    /// Seconds until a rate-limited call may be retried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl ApiError {
    /// Build from any classified subsystem error.
    ///
    /// `Internal` errors are logged here with full detail.
    pub fn from_classified<E: ClassifiedError>(err: &E) -> Self {
        let kind = err.kind();
        let message = if kind.is_client_visible() {
            err.to_string()
        } else {
            tracing::error!(reason = err.reason(), error = %err, "Internal error");
            GENERIC_INTERNAL_MESSAGE.to_string()
        };
        Self {
            kind,
            reason: err.reason(),
            message,
            retry_after_secs: None,
        }
    }

    /// Attach a retry hint.
    #[must_use]
    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }

    /// HTTP status for the kind.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind {
            ErrorKind::Unauthenticated => 401,
            ErrorKind::InvalidArgument => 400,
            ErrorKind::PermissionDenied => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::DeadlineExceeded => 410,
            ErrorKind::ResourceExhausted => 429,
            ErrorKind::Internal => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.kind, self.reason, self.message)
    }
}

impl std::error::Error for ApiError {}
