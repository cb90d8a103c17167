//! JSON projections returned to API callers.

use serde::Serialize;
use std::collections::BTreeMap;

use stakeclaim_store::{StakeAsset, StakeClaim, StakeReward};
use stakeclaim_types::{format_display_amount, AssetId, ClaimStatus, Epoch};

use crate::calendar::to_rfc3339;

/// A reward earned by holding one stake asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRewardLine {
    pub stake_asset_id: AssetId,
    pub stake_asset_name: String,
    pub stake_asset_last_claim: String,
    pub stake_asset_project: String,
    pub name: String,
    pub description: Option<String>,
    pub image: String,
    pub url: Option<String>,
    /// The paying reward token.
    pub asset_id: AssetId,
    pub amount: u64,
    pub decimals: u8,
    pub display_amount: String,
}

impl AssetRewardLine {
    pub fn new(asset: &StakeAsset, reward: &StakeReward, amount: u64) -> Self {
        Self {
            stake_asset_id: asset.asset_id.clone(),
            stake_asset_name: asset.name.clone(),
            stake_asset_last_claim: to_rfc3339(asset.last_claim),
            stake_asset_project: asset.project.clone(),
            name: reward.name.clone(),
            description: reward.description.clone(),
            image: asset.image.clone(),
            url: reward.url.clone(),
            asset_id: reward.asset_id.clone(),
            amount,
            decimals: reward.decimals,
            display_amount: format_display_amount(amount, reward.decimals),
        }
    }
}

/// A flat per-epoch reward for delegating to the pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatorRewardLine {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub asset_id: AssetId,
    pub amount: u64,
    pub decimals: u8,
    pub display_amount: String,
}

impl DelegatorRewardLine {
    pub fn new(reward: &StakeReward, amount: u64) -> Self {
        Self {
            name: reward.name.clone(),
            description: reward.description.clone(),
            image: reward.image.clone(),
            url: reward.url.clone(),
            asset_id: reward.asset_id.clone(),
            amount,
            decimals: reward.decimals,
            display_amount: format_display_amount(amount, reward.decimals),
        }
    }
}

/// Everything a wallet may currently claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardQuote {
    pub asset_rewards: Vec<AssetRewardLine>,
    pub delegator_rewards: Vec<DelegatorRewardLine>,
    pub stake_address: String,
    pub service_fee: u64,
    pub epoch: Epoch,
}

/// Accrued reward of a single stake asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetQuote {
    pub asset_id: AssetId,
    pub name: String,
    pub reward_amount: u64,
    pub reward_asset_id: AssetId,
    pub reward_name: String,
    pub reward_decimals: u8,
}

/// Public projection of a claim session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimView {
    pub session_id: String,
    pub payment_address: String,
    pub payment_amount: u64,
    pub assets: BTreeMap<AssetId, u64>,
    pub assets_readable: BTreeMap<String, String>,
    pub expires_at: String,
    pub stake_address: String,
    pub service_fee: u64,
    pub status: ClaimStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_hash: Option<String>,
}

impl From<&StakeClaim> for ClaimView {
    fn from(claim: &StakeClaim) -> Self {
        Self {
            session_id: claim.session_id.clone(),
            payment_address: claim.payment_address.clone(),
            payment_amount: claim.payment_amount,
            assets: claim.assets.clone(),
            assets_readable: claim.assets_readable.clone(),
            expires_at: to_rfc3339(claim.expires_at),
            stake_address: claim.stake_address.to_string(),
            service_fee: claim.service_fee,
            status: claim.status,
            action_hash: claim.action_hash.clone(),
        }
    }
}
