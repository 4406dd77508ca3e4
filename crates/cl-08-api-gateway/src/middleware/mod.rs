//! Request credential checks.

pub mod auth;

pub use auth::{admin_secret_matches, bearer_token, constant_time_compare};
