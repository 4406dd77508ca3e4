//! # In-Memory Document Store
//!
//! Single-process backend. All commits serialize on one write lock, which
//! gives the same compare-and-swap semantics as a hosted document database.

use crate::domain::{
    Collection, DocumentKey, Mutation, Precondition, StoreError, Version, VersionedDocument,
};
use crate::ports::DocumentBackend;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

#[derive(Default)]
struct State {
    documents: HashMap<DocumentKey, VersionedDocument>,
    /// Last version handed out.
    clock: Version,
}

/// In-memory `DocumentBackend`.
pub struct InMemoryDocumentStore {
    state: RwLock<State>,
    available: AtomicBool,
    commits: AtomicU64,
    conflicts: AtomicU64,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            available: AtomicBool::new(true),
            commits: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
        }
    }

    /// Simulate an outage. While unavailable every call fails with
    /// `StoreError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful write commits.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Number of commits rejected for stale reads.
    #[must_use]
    pub fn conflict_count(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Documents currently stored in `collection`.
    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        self.state
            .read()
            .documents
            .keys()
            .filter(|k| k.collection == collection)
            .count()
    }

    /// Whether `collection` holds no documents.
    #[must_use]
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    fn check_preconditions(
        &self,
        state: &State,
        preconditions: &[Precondition],
    ) -> Result<(), StoreError> {
        for pre in preconditions {
            let current = state.documents.get(&pre.key).map_or(0, |d| d.version);
            if current != pre.version {
                self.conflicts.fetch_add(1, Ordering::Relaxed);
                trace!(key = %pre.key, expected = pre.version, current, "Precondition failed");
                return Err(StoreError::Conflict {
                    key: pre.key.clone(),
                });
            }
        }
        Ok(())
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

impl DocumentBackend for InMemoryDocumentStore {
    fn read(&self, key: &DocumentKey) -> Result<Option<VersionedDocument>, StoreError> {
        self.ensure_available()?;
        Ok(self.state.read().documents.get(key).cloned())
    }

    fn scan(
        &self,
        collection: Collection,
    ) -> Result<Vec<(String, VersionedDocument)>, StoreError> {
        self.ensure_available()?;
        let state = self.state.read();
        let mut found: Vec<_> = state
            .documents
            .iter()
            .filter(|(k, _)| k.collection == collection)
            .map(|(k, v)| (k.id.clone(), v.clone()))
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    fn commit(
        &self,
        preconditions: &[Precondition],
        mutations: Vec<Mutation>,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;

        // Read-only transactions still validate their snapshot.
        if mutations.is_empty() {
            return self.check_preconditions(&self.state.read(), preconditions);
        }

        let mut state = self.state.write();
        self.check_preconditions(&state, preconditions)?;

        for mutation in mutations {
            match mutation {
                Mutation::Put { key, body } => {
                    state.clock += 1;
                    let version = state.clock;
                    state
                        .documents
                        .insert(key, VersionedDocument { version, body });
                }
                Mutation::Delete { key } => {
                    state.documents.remove(&key);
                }
            }
        }

        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
