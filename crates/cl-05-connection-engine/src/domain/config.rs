//! Connection engine configuration.

/// Default number of validate-then-link rounds before giving up.
pub const DEFAULT_MAX_CONNECT_ROUNDS: u32 = 3;

/// Connection engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// How many times `connect` restarts from validation when the code
    /// changed between validation and the link transaction.
    pub max_connect_rounds: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_connect_rounds: DEFAULT_MAX_CONNECT_ROUNDS,
        }
    }
}
