//! # Transaction
//!
//! Read set + buffered write set for one attempt of `Store::run_transaction`.

use crate::domain::{Document, DocumentKey, Mutation, Precondition, StoreError, Version};
use crate::ports::DocumentBackend;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

enum Pending {
    Put(Value),
    Delete,
}

/// One attempt of an optimistic multi-document transaction.
///
/// Reads are cached, so repeated reads of one document are stable and see
/// this transaction's own buffered writes.
pub struct Transaction<'a> {
    backend: &'a dyn DocumentBackend,
    /// Observed body and version per document (version 0 = absent).
    reads: BTreeMap<DocumentKey, (Version, Option<Value>)>,
    writes: BTreeMap<DocumentKey, Pending>,
    /// Keys passed to `create` without being read first.
    blind_creates: BTreeSet<DocumentKey>,
}

pub(crate) fn decode<D: Document>(key: &DocumentKey, body: Value) -> Result<D, StoreError> {
    serde_json::from_value(body).map_err(|e| StoreError::Corrupt {
        key: key.clone(),
        reason: e.to_string(),
    })
}

fn encode<D: Document>(document: &D) -> Result<Value, StoreError> {
    serde_json::to_value(document).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(backend: &'a dyn DocumentBackend) -> Self {
        Self {
            backend,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
            blind_creates: BTreeSet::new(),
        }
    }

    fn observe(&mut self, key: &DocumentKey) -> Result<Option<Value>, StoreError> {
        if let Some(pending) = self.writes.get(key) {
            return Ok(match pending {
                Pending::Put(body) => Some(body.clone()),
                Pending::Delete => None,
            });
        }
        if let Some((_, body)) = self.reads.get(key) {
            return Ok(body.clone());
        }

        let found = self.backend.read(key)?;
        let (version, body) = match found {
            Some(doc) => (doc.version, Some(doc.body)),
            None => (0, None),
        };
        self.reads.insert(key.clone(), (version, body.clone()));
        Ok(body)
    }

    /// Read a document, recording its version as a commit precondition.
    pub fn get<D: Document>(&mut self, id: &str) -> Result<Option<D>, StoreError> {
        let key = DocumentKey::new(D::COLLECTION, id);
        match self.observe(&key)? {
            Some(body) => decode(&key, body).map(Some),
            None => Ok(None),
        }
    }

    /// Buffer an insert-or-replace.
    pub fn set<D: Document>(&mut self, document: &D) -> Result<(), StoreError> {
        let body = encode(document)?;
        self.writes.insert(document.key(), Pending::Put(body));
        Ok(())
    }

    /// Buffer an insert that must not overwrite an existing document.
    ///
    /// Fails immediately if this transaction already saw the document; if it
    /// did not, existence is checked at commit.
    pub fn create<D: Document>(&mut self, document: &D) -> Result<(), StoreError> {
        let key = document.key();
        let seen = self.writes.contains_key(&key) || self.reads.contains_key(&key);
        if seen && self.observe(&key)?.is_some() {
            return Err(StoreError::AlreadyExists { key });
        }
        if !seen {
            self.blind_creates.insert(key.clone());
        }
        let body = encode(document)?;
        self.writes.insert(key, Pending::Put(body));
        Ok(())
    }

    /// Buffer a delete. Deleting an absent document is a no-op at commit.
    pub fn delete<D: Document>(&mut self, id: &str) {
        let key = DocumentKey::new(D::COLLECTION, id);
        self.blind_creates.remove(&key);
        self.writes.insert(key, Pending::Delete);
    }

    /// Whether any write is buffered.
    #[must_use]
    pub fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    pub(crate) fn commit(self) -> Result<(), StoreError> {
        let mut preconditions: Vec<Precondition> = self
            .reads
            .iter()
            .map(|(key, (version, _))| Precondition {
                key: key.clone(),
                version: *version,
            })
            .collect();
        preconditions.extend(self.blind_creates.iter().map(|key| Precondition {
            key: key.clone(),
            version: 0,
        }));

        let mutations = self
            .writes
            .into_iter()
            .map(|(key, pending)| match pending {
                Pending::Put(body) => Mutation::Put { key, body },
                Pending::Delete => Mutation::Delete { key },
            })
            .collect();

        match self.backend.commit(&preconditions, mutations) {
            // A blind create cannot succeed on retry: report it, not a conflict.
            Err(StoreError::Conflict { key }) if self.blind_creates.contains(&key) => {
                Err(StoreError::AlreadyExists { key })
            }
            other => other,
        }
    }
}
