//! Claim session identifiers.
//!
//! The identifier doubles as a bearer token for claim lookup, so it is drawn
//! from the operating system CSPRNG.

use crate::AddressError;

/// Random bytes per session id (128 bits).
pub const SESSION_ID_BYTES: usize = 16;

/// Generate a new session id: 32 lowercase hex characters.
pub fn generate_session_id() -> Result<String, AddressError> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    getrandom::getrandom(&mut bytes).map_err(|e| AddressError::Entropy(e.to_string()))?;
    Ok(hex::encode(bytes))
}
