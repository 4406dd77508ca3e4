//! # Service Layer - Subscription Inheritance

pub mod resolver;
pub mod sync;

pub use resolver::SubscriptionInheritanceResolver;
pub use sync::EntitlementSync;
