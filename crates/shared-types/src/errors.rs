//! # Error Types
//!
//! Defines the error taxonomy shared across subsystems.
//!
//! Each subsystem keeps its own `thiserror` enum, but every variant maps onto
//! one [`ErrorKind`] plus a stable machine-readable reason string so that
//! clients can branch on the reason without parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse error category returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// No valid caller identity. Always rejected before any other logic.
    Unauthenticated,
    /// Missing or malformed input, or a forbidden self-reference.
    InvalidArgument,
    /// The request collides with current state (already used, already paired).
    Conflict,
    /// Code, account or partner does not exist.
    NotFound,
    /// Rate limit exceeded.
    ResourceExhausted,
    /// The pairing code expired; the client should ask for a new one.
    DeadlineExceeded,
    /// Operator-only call without the operator secret.
    PermissionDenied,
    /// Store failure or unexpected condition. Details stay server-side.
    Internal,
}

impl ErrorKind {
    /// Stable wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidArgument => "invalid-argument",
            Self::Conflict => "conflict",
            Self::NotFound => "not-found",
            Self::ResourceExhausted => "resource-exhausted",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::PermissionDenied => "permission-denied",
            Self::Internal => "internal",
        }
    }

    /// Whether the error detail may be shown to the caller.
    #[must_use]
    pub fn is_client_visible(&self) -> bool {
        !matches!(self, Self::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every subsystem error so the gateway can map it uniformly.
pub trait ClassifiedError: std::error::Error {
    /// Taxonomy category.
    fn kind(&self) -> ErrorKind;

    /// Stable machine-readable reason (e.g. `expired`, `already-used`).
    fn reason(&self) -> &'static str;
}
