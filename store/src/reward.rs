//! Payable reward tokens and their balance bookkeeping.

use serde::{Deserialize, Serialize};
use stakeclaim_types::AssetId;

use crate::{AssetAmounts, StoreError};

/// A payable token type.
///
/// Invariant: `reserved_balance <= balance`. Every mutation path in the
/// [`StakeRewardStore`] implementations preserves it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeReward {
    /// Primary key.
    pub asset_id: AssetId,
    pub decimals: u8,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub active: bool,
    pub exclusive: bool,
    /// Tokens held by the payout wallet for this reward.
    pub balance: u64,
    /// Tokens promised to open claim sessions.
    pub reserved_balance: u64,
    /// Whether delegators of the pool receive this reward every epoch.
    pub delegator_reward: bool,
    pub delegator_reward_amount_per_epoch: u64,
    pub total_claims: u64,
    pub total_claimed_amount: u64,
}

impl StakeReward {
    /// Balance not yet promised to anyone.
    pub fn available(&self) -> u64 {
        self.balance.saturating_sub(self.reserved_balance)
    }

    /// `settings` applied over this record. The reserved balance and claim
    /// totals stay; a balance below the reservation is refused.
    pub fn reconfigured(&self, settings: &StakeReward) -> Result<StakeReward, StoreError> {
        if settings.balance < self.reserved_balance {
            return Err(StoreError::InsufficientBalance {
                asset_id: self.asset_id.clone(),
                requested: self.reserved_balance,
                available: settings.balance,
            });
        }
        Ok(StakeReward {
            reserved_balance: self.reserved_balance,
            total_claims: self.total_claims,
            total_claimed_amount: self.total_claimed_amount,
            ..settings.clone()
        })
    }
}

/// Trait for reward storage operations.
///
/// `reserve`, `release` and `settle` are each atomic over the whole map: either
/// every listed asset is updated or none is.
pub trait StakeRewardStore: Send + Sync {
    fn get_reward(&self, asset_id: &AssetId) -> Result<Option<StakeReward>, StoreError>;

    fn put_reward(&self, reward: &StakeReward) -> Result<(), StoreError>;

    fn iter_rewards(&self) -> Result<Vec<StakeReward>, StoreError>;

    /// Insert `reward`, or apply its settings to the stored record with
    /// [`StakeReward::reconfigured`], atomically. Returns the stored record.
    fn configure_reward(&self, reward: &StakeReward) -> Result<StakeReward, StoreError>;

    /// Active rewards paid to delegators every epoch.
    fn delegator_rewards(&self) -> Result<Vec<StakeReward>, StoreError> {
        Ok(self
            .iter_rewards()?
            .into_iter()
            .filter(|r| r.delegator_reward && r.active)
            .collect())
    }

    /// Increase `reserved_balance` of every listed asset.
    ///
    /// Fails with [`StoreError::InsufficientBalance`] (and changes nothing)
    /// if any asset has less than the requested amount available, or
    /// [`StoreError::NotFound`] if an asset is unknown.
    fn reserve(&self, amounts: &AssetAmounts) -> Result<(), StoreError>;

    /// Decrease `reserved_balance` of every listed asset, saturating at zero.
    ///
    /// Returns the assets whose reservation was smaller than the amount
    /// released, with the missing amount.
    fn release(&self, amounts: &AssetAmounts) -> Result<Vec<(AssetId, u64)>, StoreError>;

    /// Pay out a claim: decrease both `balance` and `reserved_balance` by the
    /// listed amounts and update the claim totals.
    fn settle(&self, amounts: &AssetAmounts) -> Result<(), StoreError>;
}
