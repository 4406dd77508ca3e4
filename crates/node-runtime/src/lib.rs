//! # Node Runtime Library
//!
//! Exposes the runtime's configuration, wiring and background tasks for
//! testing. The main entry point is the `main.rs` binary.
//!
//! ## Architectural Patterns
//!
//! - **DDD (Domain-Driven Design)**: Each subsystem owns its domain logic
//! - **Hexagonal Architecture**: Ports define contracts, Adapters implement them
//! - **Transactions over Locks**: all coordination happens in the document store

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod container;
pub mod tasks;

pub use container::{ConfigError, NodeConfig, SubsystemContainer};
