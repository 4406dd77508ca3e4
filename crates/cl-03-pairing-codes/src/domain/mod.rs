//! # Domain Layer - Pairing Codes
//!
//! - `config`: TTL, code shape and generation bounds
//! - `rules`: pure validation rule
//! - `types`: operation results
//! - `errors`: `PairingError`

pub mod config;
pub mod errors;
pub mod rules;
pub mod types;

pub use config::*;
pub use errors::*;
pub use rules::*;
pub use types::*;
