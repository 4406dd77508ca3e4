//! # CoupleLink Test Suite
//!
//! Cross-subsystem tests that need more than one crate wired together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # World: every subsystem over one in-memory store
//! └── integration/
//!     ├── e2e.rs            # issue → connect → delete cascade
//!     ├── races.rs          # concurrent connect and rate limit calls
//!     ├── invariants.rs     # seeded random operation sequences
//!     ├── rate_limits.rs    # window boundaries
//!     └── notifications.rs  # partner events after commit
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cl-tests
//! cargo test -p cl-tests integration::invariants
//! ```

#[cfg(test)]
pub mod fixtures;
pub mod integration;
