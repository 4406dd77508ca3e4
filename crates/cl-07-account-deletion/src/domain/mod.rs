//! # Domain Layer - Account Deletion

pub mod config;
pub mod errors;
pub mod report;

pub use config::*;
pub use errors::*;
pub use report::*;
