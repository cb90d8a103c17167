//! Reward-specific errors.

use stakeclaim_store::StoreError;
use stakeclaim_types::{AssetId, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("last claim of {asset_id} at {last_claim} lies after {now}")]
    Calculation {
        asset_id: AssetId,
        last_claim: Timestamp,
        now: Timestamp,
    },

    #[error("insufficient balance for {asset_id}: requested {requested}, available {available}")]
    InsufficientBalance {
        asset_id: AssetId,
        requested: u64,
        available: u64,
    },

    #[error("reward {0} not found")]
    RewardNotFound(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RewardError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InsufficientBalance {
                asset_id,
                requested,
                available,
            } => RewardError::InsufficientBalance {
                asset_id,
                requested,
                available,
            },
            StoreError::NotFound(key) => RewardError::RewardNotFound(key),
            other => RewardError::Store(other),
        }
    }
}
