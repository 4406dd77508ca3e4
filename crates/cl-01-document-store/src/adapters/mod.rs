//! Adapters layer for the document store.

pub mod memory;

pub use memory::InMemoryDocumentStore;
