//! # Domain Layer - Document Store
//!
//! - `entities`: collections, keys, versions and the typed `Document` binding
//! - `errors`: `StoreError`
//! - `config`: retry policy

pub mod config;
pub mod entities;
pub mod errors;

pub use config::*;
pub use entities::*;
pub use errors::*;
