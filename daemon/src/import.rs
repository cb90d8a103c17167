//! Operator seed files.
//!
//! A TOML file of `[[rewards]]` and `[[assets]]` tables, applied through
//! `configure_reward` and `configure_asset`: new records are inserted, known
//! ones keep their reservations, accrual start and claim totals.

use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use stakeclaim_store::{StakeAsset, StakeAssetStore, StakeReward, StakeRewardStore};
use stakeclaim_types::{AssetId, Timestamp};

/// Largest `decimals` whose scale still fits in a `u128`.
pub const MAX_DECIMALS: u8 = 38;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub rewards: Vec<RewardSeed>,
    #[serde(default)]
    pub assets: Vec<AssetSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewardSeed {
    pub asset_id: String,
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    pub balance: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "enabled")]
    pub active: bool,
    #[serde(default)]
    pub exclusive: bool,
    /// Paid to every pool delegator each epoch when set.
    #[serde(default)]
    pub delegator_reward_per_epoch: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetSeed {
    pub asset_id: String,
    pub project: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default = "enabled")]
    pub active: bool,
    pub reward_amount_per_day: u64,
    #[serde(default)]
    pub maximum_reward: Option<u64>,
    /// Asset id of the paying reward.
    pub reward: String,
    /// Accrual start for new assets, unix seconds. Defaults to the import time.
    #[serde(default)]
    pub last_claim: Option<u64>,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub rewards: usize,
    pub assets: usize,
}

impl RewardSeed {
    fn to_record(&self) -> StakeReward {
        StakeReward {
            asset_id: AssetId::new(self.asset_id.trim()),
            decimals: self.decimals,
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            url: self.url.clone(),
            active: self.active,
            exclusive: self.exclusive,
            balance: self.balance,
            reserved_balance: 0,
            delegator_reward: self.delegator_reward_per_epoch.is_some(),
            delegator_reward_amount_per_epoch: self.delegator_reward_per_epoch.unwrap_or(0),
            total_claims: 0,
            total_claimed_amount: 0,
        }
    }
}

impl AssetSeed {
    fn to_record(&self, now: Timestamp) -> StakeAsset {
        StakeAsset {
            asset_id: AssetId::new(self.asset_id.trim()),
            project: self.project.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            active: self.active,
            last_claim: self.last_claim.map(Timestamp::new).unwrap_or(now),
            reward_amount_per_day: self.reward_amount_per_day,
            maximum_reward: self.maximum_reward,
            reward: AssetId::new(self.reward.trim()),
            total_claims: 0,
            total_claimed_amount: 0,
        }
    }
}

impl SeedFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn check(&self) -> anyhow::Result<()> {
        for reward in &self.rewards {
            if reward.asset_id.trim().is_empty() {
                bail!("reward {:?} has an empty asset_id", reward.name);
            }
            if reward.decimals > MAX_DECIMALS {
                bail!(
                    "reward {}: decimals {} exceeds {MAX_DECIMALS}",
                    reward.asset_id,
                    reward.decimals
                );
            }
        }
        for asset in &self.assets {
            if asset.asset_id.trim().is_empty() {
                bail!("asset {:?} has an empty asset_id", asset.name);
            }
            if !asset.asset_id.contains('.') {
                bail!("asset {}: expected policy.assetNameHex", asset.asset_id);
            }
        }
        Ok(())
    }

    /// Write every reward, then every asset. Nothing is written when the
    /// file refers to a reward that exists neither in the file nor in the
    /// store.
    pub fn apply(
        &self,
        assets: &dyn StakeAssetStore,
        rewards: &dyn StakeRewardStore,
        now: Timestamp,
    ) -> anyhow::Result<ImportSummary> {
        self.check()?;
        for seed in &self.assets {
            let reward = seed.reward.trim();
            let listed = self.rewards.iter().any(|r| r.asset_id.trim() == reward);
            if !listed && rewards.get_reward(&AssetId::new(reward))?.is_none() {
                bail!("asset {}: reward {reward} does not exist", seed.asset_id);
            }
        }

        for seed in &self.rewards {
            let stored = rewards
                .configure_reward(&seed.to_record())
                .with_context(|| format!("reward {}", seed.asset_id))?;
            tracing::info!(
                reward = %stored.asset_id,
                balance = stored.balance,
                reserved = stored.reserved_balance,
                "configured stake reward"
            );
        }
        for seed in &self.assets {
            let stored = assets
                .configure_asset(&seed.to_record(now))
                .with_context(|| format!("asset {}", seed.asset_id))?;
            tracing::info!(
                asset = %stored.asset_id,
                project = %stored.project,
                reward = %stored.reward,
                "configured stake asset"
            );
        }

        Ok(ImportSummary {
            rewards: self.rewards.len(),
            assets: self.assets.len(),
        })
    }
}
