//! Operation results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared_types::entities::AccountId;

/// Result of `issue_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCode {
    /// The token.
    pub code: String,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
    /// True when an existing open code was returned.
    pub reused: bool,
}

/// Result of a successful `validate_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedCode {
    /// The token.
    pub code: String,
    /// Code owner.
    pub owner_id: AccountId,
    /// Owner's display name.
    pub owner_name: Option<String>,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}
