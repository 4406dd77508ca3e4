//! Credential checks: bearer token extraction and the operator secret.

use axum::http::{header, HeaderMap};

/// Token from an `Authorization: Bearer <token>` header.
///
/// Empty tokens count as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Whether `provided` matches the configured operator secret.
///
/// An empty configured secret disables admin access entirely.
pub fn admin_secret_matches(provided: &str, configured: &str) -> bool {
    !configured.is_empty() && constant_time_compare(provided, configured)
}

/// Constant-time string comparison to prevent timing attacks.
///
/// Takes the same time regardless of how many leading bytes match. Inputs
/// are padded to a common length with different fill bytes so a length
/// mismatch can never compare equal.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    let max_len = std::cmp::max(a.len(), b.len());
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}
