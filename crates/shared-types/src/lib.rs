//! # Shared Types Crate
//!
//! This crate contains the stored document entities, the error taxonomy and
//! the clock abstraction used by every CoupleLink subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every document shape persisted in the store
//!   is defined here, so all subsystems agree on field names.
//! - **Schema at the Boundary**: documents are validated and legacy fields
//!   normalised when they are read, never deep inside business logic.
//! - **Caller Identity is External**: payload types never carry the caller's
//!   account id; handlers receive it from the authenticated identity source.

pub mod entities;
pub mod errors;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use time::{Clock, ManualClock, SystemClock};
