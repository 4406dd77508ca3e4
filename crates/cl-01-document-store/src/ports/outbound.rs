//! # Outbound Ports (Driven Ports)
//!
//! The storage engine the transaction layer runs on.

use crate::domain::{Collection, DocumentKey, Mutation, Precondition, StoreError, VersionedDocument};

/// Versioned document backend with atomic conditional commits.
///
/// Production: a hosted document database with multi-document transactions.
/// Testing: `InMemoryDocumentStore`.
pub trait DocumentBackend: Send + Sync {
    /// Read one document with its version.
    fn read(&self, key: &DocumentKey) -> Result<Option<VersionedDocument>, StoreError>;

    /// Read every document in a collection, as `(id, document)` pairs.
    fn scan(&self, collection: Collection)
        -> Result<Vec<(String, VersionedDocument)>, StoreError>;

    /// Apply `mutations` atomically.
    ///
    /// ## Atomicity Guarantee
    ///
    /// Either every precondition holds and ALL mutations are applied, or the
    /// call fails with `StoreError::Conflict` naming the first stale key and
    /// NOTHING is applied.
    fn commit(
        &self,
        preconditions: &[Precondition],
        mutations: Vec<Mutation>,
    ) -> Result<(), StoreError>;
}
