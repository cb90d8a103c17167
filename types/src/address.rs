//! Address newtypes.
//!
//! Both are kept in their bech32 text form. Decoding and derivation live in
//! `stakeclaim-crypto`; these types only carry already-validated strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A payment (spending) address, e.g. `addr1...`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaymentAddress(String);

impl PaymentAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reward (stake) address identifying a wallet's staking credential,
/// e.g. `stake1...`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StakeAddress(String);

impl StakeAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StakeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StakeAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}
