//! # CL-01 Document Store
//!
//! Shared account/pairing store with optimistic multi-document transactions.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Every state-mutating operation in the pairing backend is expressed as one
//! transaction that reads the documents it depends on fresh and writes all the
//! documents it changes together. This crate provides that primitive:
//!
//! - Each read records the document version it observed (0 = absent).
//! - Writes are buffered inside the transaction.
//! - Commit is atomic and succeeds only if every observed version is still
//!   current. A losing writer re-runs its closure against fresh reads.
//!
//! ```text
//! run_transaction(f)
//!   ├── attempt 1: f(&mut tx) ── commit ──✗ Conflict
//!   ├── attempt 2: f(&mut tx) ── commit ──✓
//!   └── attempt N > max_attempts  →  StoreError::Contention
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! cl-01-document-store/
//! ├── domain/     # Collection, DocumentKey, Document trait, StoreError, StoreConfig
//! ├── ports/      # DocumentBackend (driven port)
//! ├── adapters/   # InMemoryDocumentStore
//! └── service/    # Store, Transaction
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::InMemoryDocumentStore;
pub use domain::{
    Collection, Document, DocumentKey, Mutation, Precondition, StoreConfig, StoreError,
    Version, VersionedDocument, DEFAULT_MAX_ATTEMPTS,
};
pub use ports::DocumentBackend;
pub use service::{Store, Transaction};
