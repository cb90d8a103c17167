//! Tracked stake assets.

use serde::{Deserialize, Serialize};
use stakeclaim_types::{AssetId, Timestamp};

use crate::{AssetAmounts, StoreError};

/// One tracked on-chain asset whose holder accrues rewards over time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeAsset {
    /// Dotted asset id, `policy.assetNameHex`.
    pub asset_id: AssetId,
    /// Owning project tag, used for project filters and sorting.
    pub project: String,
    pub name: String,
    pub image: String,
    pub active: bool,
    /// Accrual starts here; reset by every completed claim.
    pub last_claim: Timestamp,
    /// Raw reward units accrued per full day.
    pub reward_amount_per_day: u64,
    /// Accrual cap; `None` means uncapped.
    pub maximum_reward: Option<u64>,
    /// Asset id of the [`StakeReward`](crate::StakeReward) paying this asset.
    pub reward: AssetId,
    pub total_claims: u64,
    pub total_claimed_amount: u64,
}

impl StakeAsset {
    /// `settings` applied over this record. The accrual start and claim
    /// totals stay.
    pub fn reconfigured(&self, settings: &StakeAsset) -> StakeAsset {
        StakeAsset {
            last_claim: self.last_claim,
            total_claims: self.total_claims,
            total_claimed_amount: self.total_claimed_amount,
            ..settings.clone()
        }
    }
}

/// Trait for stake asset storage operations.
pub trait StakeAssetStore: Send + Sync {
    fn get_asset(&self, asset_id: &AssetId) -> Result<Option<StakeAsset>, StoreError>;

    /// Look an asset up by its display name (used by the single-asset quote).
    fn find_asset_by_name(&self, name: &str) -> Result<Option<StakeAsset>, StoreError>;

    fn put_asset(&self, asset: &StakeAsset) -> Result<(), StoreError>;

    fn iter_assets(&self) -> Result<Vec<StakeAsset>, StoreError>;

    /// Insert `asset`, or apply its settings to the stored record with
    /// [`StakeAsset::reconfigured`], atomically. Returns the stored record.
    fn configure_asset(&self, asset: &StakeAsset) -> Result<StakeAsset, StoreError>;

    /// Apply a settled claim: every listed asset gets `last_claim = at`, one
    /// more claim and the claimed amount added to its totals. Atomic across
    /// all listed assets.
    fn record_claims(&self, amounts: &AssetAmounts, at: Timestamp) -> Result<(), StoreError>;
}
