//! # Shared Bus - Partner Notification Channel
//!
//! Carries the outbound event a subsystem emits after a transaction commits,
//! addressed to the one counterpart account affected by the change.
//!
//! ## Rules
//!
//! - Events are published only **after** the store transaction commits.
//! - Publishing is fire-and-forget: a failed or unobserved publish is logged
//!   and never fails the operation that triggered it.
//! - Every event names exactly one recipient; there is no app-wide broadcast
//!   observed by arbitrary listeners.
//!
//! ```text
//! ┌──────────────────┐   publish()   ┌──────────────┐  subscribe(recipient)  ┌──────────────┐
//! │ Connection engine│ ────────────→ │  Event Bus   │ ─────────────────────→ │ Push delivery│
//! │ Deletion / Sync  │               │              │                        │  (external)  │
//! └──────────────────┘               └──────────────┘                        └──────────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, PartnerEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
