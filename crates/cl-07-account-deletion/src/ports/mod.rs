//! Ports layer for account deletion.

pub mod outbound;

pub use outbound::*;
