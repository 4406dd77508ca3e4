//! # CL-07 Account Deletion
//!
//! Cascades an account's removal through pairing and entitlement state
//! before the account record and its authentication identity are removed.
//!
//! **Subsystem ID:** 7
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Stages
//!
//! ```text
//! 1. cascade     tx: unlink partner, revoke entitlement inherited from us,
//!                    retire our codes and the code that linked us, audit
//! 2. references  scan accounts still naming us as partner or source, clean each in its own tx
//! 3. codes       scan codes we own or consumed, retire each in its own tx
//! 4. identity    AuthDirectory::remove_identity
//! 5. record      tx: delete account and its inheritance grant
//! 6. notify      PartnerAccountDeleted to every account we were linked to
//! ```
//!
//! Stage 1 always propagates failure. Stages 2 and 3 follow `DeletionMode`:
//! `Strict` aborts (the account survives and the call can be retried),
//! `BestEffort` logs and continues.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryAuthDirectory;
pub use domain::{DeletionConfig, DeletionError, DeletionMode, DeletionReport};
pub use ports::{AuthDirectory, DirectoryError};
pub use service::AccountDeletionCoordinator;
