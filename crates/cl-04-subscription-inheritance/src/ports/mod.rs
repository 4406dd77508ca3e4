//! Ports layer for subscription inheritance.

pub mod outbound;

pub use outbound::*;
