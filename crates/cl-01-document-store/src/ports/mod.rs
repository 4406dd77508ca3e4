//! Ports layer for the document store.

pub mod outbound;

pub use outbound::*;
