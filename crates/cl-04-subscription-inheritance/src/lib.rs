//! # CL-04 Subscription Inheritance
//!
//! Decides who inherits premium entitlement inside a pair and keeps the
//! subscription fields consistent on link, unlink, purchase change and repair.
//!
//! **Subsystem ID:** 4
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Rules
//!
//! | Rule | Description |
//! |------|-------------|
//! | Direct source only | Entitlement flows from a `direct` account to its partner, never from an `inherited` one |
//! | One beneficiary | A `direct` account shares with at most one account, tracked by an `InheritanceGrant` keyed by source |
//! | Targeted release | Unlink strips entitlement only from an account inheriting from the departing side |
//! | Direct untouched | Partner-state changes never modify a `direct` entitlement |
//!
//! ## Re-derivation
//!
//! ```text
//! a direct               → a stays direct
//! a not direct, b direct → a inherits from b
//! neither direct         → a none
//! ```
//!
//! The resolver is the only writer of `subscription_type` and
//! `subscription_source_account_id`. It mutates the accounts handed to it
//! inside the caller's transaction and writes grant documents itself; the
//! caller persists the accounts.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::StaticEntitlementVerifier;
pub use domain::{derive_pair, EntitlementTarget, InheritanceError, PairOutcome, SyncOutcome};
pub use ports::{EntitlementVerifier, VerifierError};
pub use service::{EntitlementSync, SubscriptionInheritanceResolver};
