//! Pure validation rule shared by `validate_code` and the connection engine.

use super::errors::PairingError;
use chrono::{DateTime, Utc};
use shared_types::entities::{Account, AccountId, PairingCode};

/// Canonicalize a client-supplied token.
///
/// Surrounding whitespace is ignored; anything other than exactly
/// `length` ASCII digits is `InvalidCode`.
pub fn normalize_code(raw: &str, length: usize) -> Result<String, PairingError> {
    let code = raw.trim();
    if code.len() != length || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PairingError::InvalidCode);
    }
    Ok(code.to_string())
}

/// Decide whether `requester_id` may connect through `code`.
///
/// Checks run in a fixed priority order so a client always sees the most
/// actionable reason. `Expired` and `OwnerMissing` tell the caller the code
/// should be retired.
pub fn evaluate(
    code: &PairingCode,
    owner: Option<&Account>,
    requester: Option<&Account>,
    requester_id: &AccountId,
    now: DateTime<Utc>,
) -> Result<(), PairingError> {
    if !code.is_active {
        return Err(PairingError::Inactive);
    }
    if code.is_expired(now) {
        return Err(PairingError::Expired);
    }
    if &code.owner_id == requester_id {
        return Err(PairingError::SelfConnection);
    }
    if code
        .connected_partner_id
        .as_ref()
        .is_some_and(|partner| partner != requester_id)
    {
        return Err(PairingError::AlreadyUsed);
    }
    let Some(owner) = owner else {
        return Err(PairingError::OwnerMissing);
    };
    let Some(requester) = requester else {
        return Err(PairingError::AccountMissing);
    };
    if requester.partner_id.is_some() {
        return Err(PairingError::AlreadyConnected);
    }
    if owner
        .partner_id
        .as_ref()
        .is_some_and(|partner| partner != requester_id)
    {
        return Err(PairingError::AlreadyUsed);
    }
    Ok(())
}
