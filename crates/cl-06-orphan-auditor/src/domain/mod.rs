//! # Domain Layer - Orphan Auditor

pub mod detection;
pub mod errors;

pub use detection::*;
pub use errors::*;
