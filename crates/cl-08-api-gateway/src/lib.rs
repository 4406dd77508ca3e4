//! # CL-08 API Gateway
//!
//! Authenticated JSON surface over the pairing subsystems.
//!
//! **Subsystem ID:** 8
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Operations
//!
//! | Operation | Body | Result | Rate gate |
//! |-----------|------|--------|-----------|
//! | `issuePairingCode` | | `{ code, expiresAt, reused }` | issue-code |
//! | `validatePairingCode` | `{ code }` | `{ valid, ownerName, ownerId }` or `{ valid: false, reason }` | validate-code |
//! | `connectToPartner` | `{ code }` | `{ partnerId, subscriptionInherited }` | connect |
//! | `disconnectPartner` | | `{ ok, formerPartnerId }` | disconnect |
//! | `deleteAccount` | | `{ ok }` | delete-account |
//! | `syncSubscription` | `{ receipt? }` | `{ subscriptionType, partnerId, partnerSubscriptionType }` | sync-subscription |
//! | `acknowledgeConnection` | | `{ ok }` | |
//! | `getPairingStatus` | | pairing status | |
//! | `diagnoseOrphans` | `{ adminSecret }` | `{ checkedCount, violations }` | |
//! | `cleanupOrphans` | `{ adminSecret }` | `{ checkedCount, cleanedCount }` | |
//! | `sweepRateLimits` | `{ adminSecret }` | `{ removedCount }` | |
//!
//! ## Request Order
//!
//! ```text
//! caller op:   bearer token → IdentityProvider → ensure account → rate gate → subsystem
//! operator op: adminSecret (constant time) → subsystem
//! ```
//!
//! Errors leave as `{ "error": { kind, reason, message } }` with the HTTP
//! status of the kind. `internal` errors never carry detail.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod router;
pub mod service;

#[cfg(test)]
mod testkit;

pub use adapters::StaticTokenIdentity;
pub use domain::{
    AdminRequest, ApiError, ApiOperation, CodeRequest, DisconnectResponse, GatewayConfig,
    GatewayError, OkResponse, SweepResponse, SyncRequest, ValidateResponse,
};
pub use ports::{Identity, IdentityProvider};
pub use router::{create_router, serve};
pub use service::{GatewayService, Subsystems};
