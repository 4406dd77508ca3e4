//! Adapters layer for subscription inheritance.

pub mod verifier;

pub use verifier::StaticEntitlementVerifier;
