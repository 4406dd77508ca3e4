//! # Outbound Ports
//!
//! Source of candidate tokens.

/// Generates candidate pairing codes.
///
/// Candidates need not be unique; the registry checks the store and retries
/// on collision.
pub trait CodeSource: Send + Sync {
    /// Next candidate of exactly `length` ASCII digits.
    fn next_code(&self, length: usize) -> String;
}
