//! # CL-02 Rate Limiter
//!
//! Fixed-window call counter per `(account, operation)`.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Algorithm
//!
//! ```text
//! bucket = floor(unix_minutes / window_minutes)
//! tx {
//!     window = get(account:operation:bucket) or empty
//!     if window.count < max_calls { window.count += 1; allow }
//!     else                       { deny (enforcing) | allow + security event (log-only) }
//! }
//! ```
//!
//! The read and the increment are one store transaction, so two concurrent
//! callers can never both observe `max_calls - 1` and both be allowed.
//!
//! ## Modes
//!
//! | Setting | Values | Effect |
//! |---------|--------|--------|
//! | `EnforcementMode` | `Enforcing` / `LogOnly` | deny over the limit, or allow and record |
//! | `FailurePolicy` | `FailOpen` / `Strict` | store outage allows, or propagates |
//!
//! Both are fixed at construction and never selected by a caller.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod service;

pub use domain::{
    retry_after_secs, window_bucket, EnforcementMode, FailurePolicy, Operation, RateDecision,
    RateLimitError, RateLimitPolicy, RateLimiterConfig, DEFAULT_WINDOW_RETENTION_HOURS,
};
pub use service::RateLimiter;
