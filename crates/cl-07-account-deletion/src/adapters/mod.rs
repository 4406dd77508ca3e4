//! Adapters layer for account deletion.

pub mod directory;

pub use directory::InMemoryAuthDirectory;
