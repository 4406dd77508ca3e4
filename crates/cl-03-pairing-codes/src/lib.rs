//! # CL-03 Pairing Codes
//!
//! Issues, validates and retires the short-lived numeric codes one account
//! shares with a prospective partner.
//!
//! **Subsystem ID:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Lifecycle
//!
//! ```text
//!   issue ──→ [active, open] ──connect──→ [active, consumed] ──disconnect/delete──→ [inactive]
//!                  │                                                                  ▲
//!                  ├──── expires_at passed (found on read) ───────────────────────────┤
//!                  ├──── owner account missing (found on read) ───────────────────────┤
//!                  └──── owner re-issues / pairs through another code ────────────────┘
//! ```
//!
//! A retired code is never reopened; the owner must issue a new token.
//!
//! ## Validation Order
//!
//! | # | Check | Reason |
//! |---|-------|--------|
//! | 1 | code exists | `not-found` |
//! | 2 | code active | `inactive` |
//! | 3 | not expired (retired on read) | `expired` |
//! | 4 | requester is not the owner | `self` |
//! | 5 | not consumed by another account | `already-used` |
//! | 6 | owner account exists (retired on read) | `owner-missing` |
//! | 7 | requester account exists | `account-missing` |
//! | 8 | requester has no partner | `already-connected` |
//! | 9 | owner has no other partner | `already-used` |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{RandomCodeSource, SequenceCodeSource};
pub use domain::{
    evaluate, normalize_code, IssuedCode, PairingCodeConfig, PairingError, ValidatedCode,
    DEFAULT_CODE_LENGTH, DEFAULT_MAX_GENERATION_ATTEMPTS,
};
pub use ports::CodeSource;
pub use service::{
    check_code, release_codes, release_pair_codes, CheckedCode, PairingCodeRegistry,
};
