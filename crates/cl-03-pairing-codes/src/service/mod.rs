//! # Pairing Code Service
//!
//! - `registry`: `PairingCodeRegistry` (issue / validate)
//! - `lifecycle`: in-transaction helpers shared with the connection engine
//!   and the deletion coordinator

mod lifecycle;
mod registry;

pub use lifecycle::{check_code, release_codes, release_pair_codes, CheckedCode};
pub use registry::PairingCodeRegistry;
