//! # Domain Layer - Subscription Inheritance

pub mod errors;
pub mod rules;

pub use errors::*;
pub use rules::*;
