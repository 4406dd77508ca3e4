//! # CL-06 Orphan Auditor
//!
//! Finds accounts whose inherited entitlement no longer has a valid source
//! and clears it.
//!
//! **Subsystem ID:** 6
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Categories
//!
//! | Category | Condition (account is `inherited`) |
//! |----------|------------------------------------|
//! | `no-partner` | no `partner_id`, or the partner does not point back |
//! | `partner-deleted` | partner document missing |
//! | `partner-lost-direct-subscription` | partner is not `direct` |
//! | `source-not-partner` | partner live and direct, source is someone else |
//!
//! `diagnose` and `cleanup` share `classify`; cleanup re-runs it per account
//! inside the repair transaction and writes an `orphan-repair` audit record.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod service;

pub use domain::{
    classify, detect, AuditError, CleanupReport, DiagnosisReport, OrphanCategory,
    OrphanViolation,
};
pub use service::OrphanAuditor;
