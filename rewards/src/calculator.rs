//! Reward accrual.
//!
//! `accrued = floor(elapsed_secs × reward_amount_per_day / 86_400)`, clamped
//! to the asset's cap. Integer arithmetic throughout; the product is taken in
//! `u128` so no realistic rate or interval can overflow.

use stakeclaim_store::{StakeAsset, StakeReward};
use stakeclaim_types::time::SECONDS_PER_DAY;
use stakeclaim_types::Timestamp;

use crate::RewardError;

/// Raw reward units accrued by `asset` since its last claim.
///
/// Fails with [`RewardError::Calculation`] if the last claim lies in the
/// future; such an asset must be skipped or rejected, never paid.
pub fn accrue(asset: &StakeAsset, now: Timestamp) -> Result<u64, RewardError> {
    let elapsed = asset
        .last_claim
        .elapsed_until(now)
        .ok_or_else(|| RewardError::Calculation {
            asset_id: asset.asset_id.clone(),
            last_claim: asset.last_claim,
            now,
        })?;

    let raw = elapsed as u128 * asset.reward_amount_per_day as u128 / SECONDS_PER_DAY as u128;
    let amount = u64::try_from(raw).unwrap_or(u64::MAX);

    Ok(match asset.maximum_reward {
        Some(cap) => amount.min(cap),
        None => amount,
    })
}

/// The flat per-epoch amount `reward` pays a delegator, if it can afford it.
///
/// Returns `None` (and logs) when the unreserved balance is below the
/// per-epoch amount.
pub fn delegator_reward_amount(reward: &StakeReward) -> Option<u64> {
    let amount = reward.delegator_reward_amount_per_epoch;
    if amount > reward.available() {
        tracing::info!(
            reward = %reward.asset_id,
            name = %reward.name,
            amount,
            available = reward.available(),
            "not enough tokens to fulfil delegator reward"
        );
        return None;
    }
    Some(amount)
}
