//! # Domain Layer - Rate Limiter
//!
//! - `operation`: guarded operations and their static policies
//! - `config`: enforcement mode and store-failure policy
//! - `window`: bucket arithmetic
//! - `errors`: `RateLimitError`

pub mod config;
pub mod errors;
pub mod operation;
pub mod window;

pub use config::*;
pub use errors::*;
pub use operation::*;
pub use window::*;
