//! # Store Entities
//!
//! Documents live in named collections as JSON values, each with a
//! monotonically assigned version. Version `0` means "absent".

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_types::entities::{
    Account, ConnectionAuditRecord, InheritanceGrant, PairingCode, RateLimitWindow,
    SecurityEvent,
};
use std::fmt;

/// Document version. Never reused, so a deleted-then-recreated document
/// cannot be mistaken for the one a transaction observed.
pub type Version = u64;

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// `Account` documents keyed by account id.
    Accounts,
    /// `PairingCode` documents keyed by code.
    PairingCodes,
    /// `RateLimitWindow` documents keyed by `account:operation:bucket`.
    RateLimits,
    /// Append-only `ConnectionAuditRecord`s.
    ConnectionAudit,
    /// `InheritanceGrant` documents keyed by source account.
    InheritanceGrants,
    /// `SecurityEvent` documents.
    SecurityEvents,
}

impl Collection {
    /// Storage name of the collection.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::PairingCodes => "pairing_codes",
            Self::RateLimits => "rate_limits",
            Self::ConnectionAudit => "connection_audit",
            Self::InheritanceGrants => "inheritance_grants",
            Self::SecurityEvents => "security_events",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    /// Collection.
    pub collection: Collection,
    /// Document id within the collection.
    pub id: String,
}

impl DocumentKey {
    /// Build a key.
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A stored document body with its version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedDocument {
    /// Version assigned at the last write.
    pub version: Version,
    /// JSON body.
    pub body: Value,
}

/// Commit precondition: `key` must currently be at `version` (0 = absent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    /// Document checked.
    pub key: DocumentKey,
    /// Version it must still have.
    pub version: Version,
}

/// Buffered write applied at commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Replace or insert the body.
    Put {
        /// Target.
        key: DocumentKey,
        /// New body.
        body: Value,
    },
    /// Remove the document.
    Delete {
        /// Target.
        key: DocumentKey,
    },
}

impl Mutation {
    /// The document this mutation touches.
    #[must_use]
    pub fn key(&self) -> &DocumentKey {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Typed binding between an entity and its collection.
pub trait Document: Serialize + DeserializeOwned {
    /// Collection the entity lives in.
    const COLLECTION: Collection;

    /// Document id of this instance.
    fn document_id(&self) -> String;

    /// Full key of this instance.
    fn key(&self) -> DocumentKey {
        DocumentKey::new(Self::COLLECTION, self.document_id())
    }
}

impl Document for Account {
    const COLLECTION: Collection = Collection::Accounts;

    fn document_id(&self) -> String {
        self.id.0.clone()
    }
}

impl Document for PairingCode {
    const COLLECTION: Collection = Collection::PairingCodes;

    fn document_id(&self) -> String {
        self.code.clone()
    }
}

impl Document for RateLimitWindow {
    const COLLECTION: Collection = Collection::RateLimits;

    fn document_id(&self) -> String {
        self.id()
    }
}

impl Document for ConnectionAuditRecord {
    const COLLECTION: Collection = Collection::ConnectionAudit;

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

impl Document for InheritanceGrant {
    const COLLECTION: Collection = Collection::InheritanceGrants;

    fn document_id(&self) -> String {
        self.source_id.0.clone()
    }
}

impl Document for SecurityEvent {
    const COLLECTION: Collection = Collection::SecurityEvents;

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}
