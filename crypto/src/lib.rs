//! Address and identifier primitives for stakeclaim.
//!
//! - Bech32 decoding of Shelley payment addresses
//! - Reward (stake) address derivation from base addresses
//! - Handle asset naming
//! - CSPRNG-backed claim session identifiers

pub mod address;
pub mod session;

pub use address::{decode_address, derive_stake_address, handle_unit, AddressInput};
pub use session::generate_session_id;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid bech32 address: {0}")]
    Bech32(String),

    #[error("unexpected address length: {0} bytes")]
    InvalidLength(usize),

    #[error("address belongs to network {found}, expected {expected}")]
    NetworkMismatch { expected: u8, found: u8 },

    #[error("handle must not be empty")]
    EmptyHandle,

    #[error("entropy source failed: {0}")]
    Entropy(String),
}
