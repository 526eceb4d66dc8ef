//! Shared-secret token verification.

use subtle::ConstantTimeEq;

/// Verify a caller-supplied token against the configured secret.
///
/// Absent or empty values never verify. Equal-length inputs are compared in
/// constant time; a length mismatch is rejected without inspecting content.
pub fn verify_token(provided: Option<&str>, expected: &str) -> bool {
    let Some(provided) = provided else { return false };
    if provided.is_empty() || expected.is_empty() {
        return false;
    }
    bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
}
