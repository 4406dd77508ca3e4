//! # Store Service
//!
//! Typed access and the transaction retry loop on top of a `DocumentBackend`.

mod transaction;

pub use transaction::Transaction;

use crate::adapters::InMemoryDocumentStore;
use crate::domain::{Document, DocumentKey, StoreConfig, StoreError};
use crate::ports::DocumentBackend;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handle to the shared document store. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn DocumentBackend>,
    config: StoreConfig,
}

impl Store {
    /// Wrap a backend.
    pub fn new(backend: Arc<dyn DocumentBackend>, config: StoreConfig) -> Self {
        Self { backend, config }
    }

    /// Store over a fresh in-memory backend, returning both handles.
    #[must_use]
    pub fn in_memory() -> (Self, Arc<InMemoryDocumentStore>) {
        let backend = Arc::new(InMemoryDocumentStore::new());
        (
            Self::new(backend.clone(), StoreConfig::default()),
            backend,
        )
    }

    /// Active retry policy.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run `body` as one atomic transaction.
    ///
    /// `body` may be invoked several times: each attempt starts from an empty
    /// transaction and fresh reads, so it must derive every write from what it
    /// reads through the transaction. When it returns `Err` nothing is
    /// written. When it returns `Ok` the buffered writes are committed, and if
    /// a document it read has changed meanwhile the attempt is discarded and
    /// `body` runs again.
    ///
    /// To commit self-healing writes while still reporting a rejection, return
    /// `Ok(Err(rejection))`.
    pub async fn run_transaction<T, E, F>(&self, mut body: F) -> Result<T, E>
    where
        F: FnMut(&mut Transaction<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let attempts = self.config.max_attempts.max(1);

        for attempt in 1..=attempts {
            let outcome = {
                let mut tx = Transaction::new(self.backend.as_ref());
                let value = body(&mut tx)?;
                tx.commit().map(|()| value)
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Transaction committed after retry");
                    }
                    return Ok(value);
                }
                Err(StoreError::Conflict { key }) => {
                    debug!(attempt, key = %key, "Transaction conflict, retrying");
                    if let Some(pause) = self.config.backoff {
                        tokio::time::sleep(pause).await;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(attempts, "Transaction abandoned under contention");
        Err(StoreError::Contention { attempts }.into())
    }

    /// Read one document outside any transaction.
    pub fn get<D: Document>(&self, id: &str) -> Result<Option<D>, StoreError> {
        let key = DocumentKey::new(D::COLLECTION, id);
        match self.backend.read(&key)? {
            Some(doc) => transaction::decode(&key, doc.body).map(Some),
            None => Ok(None),
        }
    }

    /// Read a whole collection outside any transaction.
    ///
    /// Documents that fail to decode are logged and skipped so one corrupt
    /// record cannot block a scan-driven repair.
    pub fn scan<D: Document>(&self) -> Result<Vec<D>, StoreError> {
        let docs = self.backend.scan(D::COLLECTION)?;
        let mut out = Vec::with_capacity(docs.len());
        for (id, doc) in docs {
            let key = DocumentKey::new(D::COLLECTION, id);
            match transaction::decode(&key, doc.body) {
                Ok(decoded) => out.push(decoded),
                Err(e) => warn!(error = %e, "Skipping undecodable document"),
            }
        }
        Ok(out)
    }

    /// Blind single-document write.
    pub async fn upsert<D: Document>(&self, document: &D) -> Result<(), StoreError> {
        self.run_transaction(|tx| tx.set(document)).await
    }
}
