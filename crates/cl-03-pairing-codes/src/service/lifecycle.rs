//! In-transaction code helpers.

use crate::domain::{evaluate, PairingError};
use chrono::{DateTime, Utc};
use cl_01_document_store::{StoreError, Transaction};
use shared_types::entities::{Account, AccountId, DeactivationReason, PairingCode};

/// A code that passed validation, with the documents it was checked against.
#[derive(Debug, Clone)]
pub struct CheckedCode {
    /// The code.
    pub code: PairingCode,
    /// Its owner.
    pub owner: Account,
    /// The requesting account.
    pub requester: Account,
}

/// Read the code, its owner and the requester inside `tx` and evaluate them.
///
/// The outer `Result` is the store; the inner one is the validation verdict.
/// No writes are made.
pub fn check_code(
    tx: &mut Transaction<'_>,
    code: &str,
    requester_id: &AccountId,
    now: DateTime<Utc>,
) -> Result<Result<CheckedCode, PairingError>, StoreError> {
    let Some(pairing) = tx.get::<PairingCode>(code)? else {
        return Ok(Err(PairingError::NotFound));
    };
    // Fail fast on the code alone before touching account documents.
    if !pairing.is_active {
        return Ok(Err(PairingError::Inactive));
    }
    let owner = tx.get::<Account>(pairing.owner_id.as_str())?;
    let requester = tx.get::<Account>(requester_id.as_str())?;

    if let Err(rejection) = evaluate(
        &pairing,
        owner.as_ref(),
        requester.as_ref(),
        requester_id,
        now,
    ) {
        return Ok(Err(rejection));
    }

    match (owner, requester) {
        (Some(owner), Some(requester)) => Ok(Ok(CheckedCode {
            code: pairing,
            owner,
            requester,
        })),
        (None, _) => Ok(Err(PairingError::OwnerMissing)),
        (_, None) => Ok(Err(PairingError::AccountMissing)),
    }
}

/// Retire every consumed code linking `first` and `second`.
///
/// Looks at each side's `active_pairing_code`; a code owned by that side and
/// consumed (by anyone) is deactivated with `reason` and the pointer cleared.
/// Open, unconsumed codes are left alone. The accounts are mutated in place;
/// the caller persists them. Returns the retired tokens.
pub fn release_pair_codes(
    tx: &mut Transaction<'_>,
    first: &mut Account,
    second: &mut Account,
    reason: DeactivationReason,
    now: DateTime<Utc>,
) -> Result<Vec<String>, StoreError> {
    release_codes(tx, [first, second], reason, now)
}

/// Same as [`release_pair_codes`] for any number of accounts, including one
/// whose partner document is already gone.
pub fn release_codes<'a>(
    tx: &mut Transaction<'_>,
    sides: impl IntoIterator<Item = &'a mut Account>,
    reason: DeactivationReason,
    now: DateTime<Utc>,
) -> Result<Vec<String>, StoreError> {
    let mut released = Vec::new();
    for side in sides {
        let Some(token) = side.active_pairing_code.clone() else {
            continue;
        };
        match tx.get::<PairingCode>(&token)? {
            Some(mut code) if code.owner_id == side.id && code.is_consumed() => {
                code.deactivate(reason, now);
                tx.set(&code)?;
                side.active_pairing_code = None;
                released.push(token);
            }
            Some(code) if code.owner_id == side.id && code.is_active => {}
            // Dangling or foreign pointer.
            _ => side.active_pairing_code = None,
        }
    }
    Ok(released)
}
