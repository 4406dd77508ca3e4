//! # Subsystem Container
//!
//! Central container holding all subsystem instances with their shared
//! infrastructure and configuration.
//!
//! - Subsystems initialized in dependency order (Level 0 → Level 4)
//! - Adapters implement outbound ports for each subsystem

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, HttpConfig, NodeConfig, ScheduleConfig, SeedConfig};
pub use subsystems::SubsystemContainer;
