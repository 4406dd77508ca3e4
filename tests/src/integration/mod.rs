//! Cross-subsystem integration tests.

mod e2e;
mod invariants;
mod notifications;
mod races;
mod rate_limits;
