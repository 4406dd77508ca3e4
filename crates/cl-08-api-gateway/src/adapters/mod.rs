//! Adapters: identity table and error conversions.

pub mod error_conversions;
pub mod identity;

pub use identity::StaticTokenIdentity;
