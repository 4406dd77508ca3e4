//! Ports layer for pairing codes.

pub mod outbound;

pub use outbound::*;
