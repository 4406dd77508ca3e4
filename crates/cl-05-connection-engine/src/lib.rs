//! # CL-05 Connection Engine
//!
//! Links and unlinks two accounts atomically.
//!
//! **Subsystem ID:** 5
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Connect
//!
//! ```text
//! validate_code ──► tx {
//!                     re-check code, owner, requester (fresh reads)
//!                     code.connected_partner_id = requester
//!                     owner.partner_id = requester, requester.partner_id = owner
//!                     retire requester's own open code
//!                     reconcile entitlement
//!                     owner.has_unseen_connection = true
//!                     append audit record
//!                   } ──► publish PartnerConnected(owner)
//! ```
//!
//! Concurrent connects on one code are serialized by the code document's
//! version: the losing transaction re-runs, sees the code consumed and the
//! flow restarts from validation, which reports the rejection.
//!
//! ## Disconnect
//!
//! One transaction clears `partner_id` on both sides, retires the consumed
//! code that linked them, runs the unlink path of the inheritance resolver on
//! each side independently and appends an audit record. A consumed code is
//! never reopened.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod service;

pub use domain::{
    ConnectOutcome, ConnectionConfig, ConnectionError, DisconnectOutcome, PairingStatus,
    DEFAULT_MAX_CONNECT_ROUNDS,
};
pub use service::ConnectionTransactionEngine;
