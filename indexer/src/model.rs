//! Response bodies of the indexer endpoints.
//!
//! Quantities arrive as decimal strings; callers parse them where needed.

use serde::Deserialize;
use stakeclaim_types::Epoch;

/// Result of a lookup that distinguishes "does not exist" from data.
///
/// `Absent` is returned for a 404 on a single-object query or on the first
/// page of a paginated one. It is never an empty sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Absent,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(v) => Lookup::Found(f(v)),
            Lookup::Absent => Lookup::Absent,
        }
    }
}

/// `GET /epochs/latest`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EpochInfo {
    pub epoch: Epoch,
}

/// `GET /accounts/{stake}`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    /// Pool the account delegates to; `None` when undelegated.
    #[serde(default)]
    pub pool_id: Option<String>,
}

/// One entry of `GET /accounts/{stake}/addresses/assets`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AssetQuantity {
    /// `policy ++ assetNameHex`, undotted.
    pub unit: String,
    pub quantity: String,
}

/// One entry of `GET /epochs/{epoch}/stakes/{pool}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PoolStake {
    pub stake_address: String,
    /// Active stake in lovelace.
    pub amount: String,
}

impl PoolStake {
    pub fn amount(&self) -> Option<u64> {
        self.amount.parse().ok()
    }
}

/// One entry of `GET /assets/{unit}/addresses`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AssetHolder {
    pub address: String,
}
