//! Reward discovery.
//!
//! Works out what a wallet may claim right now from ledger facts and the
//! tracked assets and rewards. Discovery also invalidates any OPEN session of
//! the wallet, so a fresh quote always starts from released balances.

use std::collections::HashSet;

use stakeclaim_indexer::Lookup;
use stakeclaim_rewards::{accrue, delegator_reward_amount};
use stakeclaim_store::StakeAsset;
use stakeclaim_types::{AssetId, Epoch, StakeAddress, Timestamp};

use crate::service::ClaimService;
use crate::view::{AssetQuote, AssetRewardLine, DelegatorRewardLine, RewardQuote};
use crate::ClaimError;

const MSG_EPOCH: &str = "Could not query latest epoch";
const MSG_ACCOUNT: &str = "Could not query account info";
const MSG_ACTIVE_STAKE: &str = "Could not query active stake";
const MSG_WALLET_ASSETS: &str =
    "There was an error fetching your wallet assets. Please try again later.";

impl ClaimService {
    /// Everything the wallet behind `address` may claim, optionally limited
    /// to the assets of `projects`.
    pub async fn quote_rewards(
        &self,
        address: &str,
        projects: Option<&[String]>,
    ) -> Result<RewardQuote, ClaimError> {
        let stake_address = self.resolve_stake_address(address).await?;
        let _guard = self.locks.lock(stake_address.as_str()).await;
        self.discover_locked(&stake_address, projects).await
    }

    /// Discovery proper. The caller holds the lock of `stake_address`.
    pub(crate) async fn discover_locked(
        &self,
        stake_address: &StakeAddress,
        projects: Option<&[String]>,
    ) -> Result<RewardQuote, ClaimError> {
        tracing::info!(stake = %stake_address, "fetching rewards");
        self.invalidate_open_locked(stake_address)?;

        let epoch = match self.indexer.latest_epoch().await {
            Ok(Lookup::Found(info)) => info.epoch,
            Ok(Lookup::Absent) => return Err(ClaimError::external(MSG_EPOCH, "no latest epoch")),
            Err(e) => {
                tracing::error!(error = %e, "could not query latest epoch");
                return Err(ClaimError::external(MSG_EPOCH, e));
            }
        };

        let claimed_in_epoch = self.claims.has_completed_claim(stake_address, epoch)?;
        if claimed_in_epoch {
            tracing::info!(stake = %stake_address, epoch, "wallet already claimed in this epoch");
        }

        let account = match self.indexer.account_info(stake_address).await {
            Ok(Lookup::Found(account)) => account,
            Ok(Lookup::Absent) => {
                tracing::info!(stake = %stake_address, "account not found");
                return Err(ClaimError::AccountNotFound(stake_address.to_string()));
            }
            Err(e) => {
                tracing::error!(stake = %stake_address, error = %e, "could not query account info");
                return Err(ClaimError::external(MSG_ACCOUNT, e));
            }
        };
        let Some(pool_id) = account.pool_id else {
            tracing::info!(stake = %stake_address, "wallet is not delegated");
            return Err(ClaimError::NotDelegated(stake_address.to_string()));
        };
        let is_delegator = pool_id == self.config.pool_id;
        let service_fee = if is_delegator {
            0
        } else {
            self.config.fees.service_fee
        };

        let delegator_rewards = if is_delegator && !claimed_in_epoch && projects.is_none() {
            self.delegator_lines(stake_address, epoch).await?
        } else {
            Vec::new()
        };

        let holdings = match self.indexer.assets_for_stake_address(stake_address).await {
            Ok(Lookup::Found(holdings)) => holdings,
            Ok(Lookup::Absent) => {
                tracing::error!(stake = %stake_address, "wallet assets not found");
                return Err(ClaimError::external(MSG_WALLET_ASSETS, "no assets listing"));
            }
            Err(e) => {
                tracing::error!(stake = %stake_address, error = %e, "could not fetch wallet assets");
                return Err(ClaimError::external(MSG_WALLET_ASSETS, e));
            }
        };

        let now = self.clock.now();
        let mut seen = HashSet::new();
        let mut asset_rewards = Vec::new();
        for holding in &holdings {
            let Some(asset_id) = self.tracked_asset_id(&holding.unit) else {
                continue;
            };
            if !seen.insert(asset_id.clone()) {
                continue;
            }
            if let Some(line) = self.asset_line(&asset_id, projects, now)? {
                asset_rewards.push(line);
            }
        }
        asset_rewards.sort_by(|a, b| a.stake_asset_project.cmp(&b.stake_asset_project));

        if delegator_rewards.is_empty() && asset_rewards.is_empty() {
            tracing::info!(stake = %stake_address, "wallet does not qualify for any rewards");
            return Err(ClaimError::NoEligibleRewards(stake_address.to_string()));
        }

        tracing::info!(
            stake = %stake_address,
            epoch,
            delegator = delegator_rewards.len(),
            assets = asset_rewards.len(),
            "fetched rewards"
        );
        Ok(RewardQuote {
            asset_rewards,
            delegator_rewards,
            stake_address: stake_address.to_string(),
            service_fee,
            epoch,
        })
    }

    async fn delegator_lines(
        &self,
        stake_address: &StakeAddress,
        epoch: Epoch,
    ) -> Result<Vec<DelegatorRewardLine>, ClaimError> {
        let mut lines = Vec::new();

        if let Some(pool_reward) = &self.config.pool_reward_asset {
            let stakes = match self
                .indexer
                .pool_stake_distribution(epoch, &self.config.pool_id)
                .await
            {
                Ok(Lookup::Found(stakes)) => stakes,
                Ok(Lookup::Absent) => {
                    return Err(ClaimError::external(MSG_ACTIVE_STAKE, "no stake distribution"))
                }
                Err(e) => {
                    tracing::error!(epoch, error = %e, "could not query active stake");
                    return Err(ClaimError::external(MSG_ACTIVE_STAKE, e));
                }
            };
            if let Some(stake) = stakes
                .iter()
                .find(|s| s.stake_address == stake_address.as_str())
            {
                let amount = stake.amount().ok_or_else(|| {
                    ClaimError::external(
                        MSG_ACTIVE_STAKE,
                        format!("unparseable stake amount {:?}", stake.amount),
                    )
                })?;
                match self.rewards.get_reward(pool_reward)? {
                    Some(reward) if reward.active => {
                        lines.push(DelegatorRewardLine::new(&reward, amount));
                    }
                    _ => tracing::debug!(reward = %pool_reward, "pool reward not offered"),
                }
            }
        }

        for reward in self.rewards.delegator_rewards()? {
            if let Some(amount) = delegator_reward_amount(&reward) {
                lines.push(DelegatorRewardLine::new(&reward, amount));
            }
        }
        Ok(lines)
    }

    /// The tracked asset id of an indexer unit, if it belongs to a tracked
    /// policy.
    fn tracked_asset_id(&self, unit: &str) -> Option<AssetId> {
        self.config
            .stake_asset_policy_ids
            .iter()
            .find_map(|policy| AssetId::from_unit(unit, policy))
    }

    fn asset_line(
        &self,
        asset_id: &AssetId,
        projects: Option<&[String]>,
        now: Timestamp,
    ) -> Result<Option<AssetRewardLine>, ClaimError> {
        let Some(asset) = self.assets.get_asset(asset_id)? else {
            tracing::info!(asset = %asset_id, "no stake asset for held asset");
            return Ok(None);
        };
        if !asset.active {
            return Ok(None);
        }
        if let Some(projects) = projects {
            if !projects.contains(&asset.project) {
                return Ok(None);
            }
        }
        let amount = match accrue(&asset, now) {
            Ok(amount) => amount,
            Err(e) => {
                tracing::warn!(asset = %asset_id, error = %e, "skipping asset");
                return Ok(None);
            }
        };
        let Some(reward) = self.rewards.get_reward(&asset.reward)? else {
            tracing::info!(asset = %asset_id, reward = %asset.reward, "stake reward not found");
            return Ok(None);
        };
        if !reward.active {
            return Ok(None);
        }
        Ok(Some(AssetRewardLine::new(&asset, &reward, amount)))
    }

    /// Accrued reward of one stake asset, looked up by id or display name.
    pub fn quote_asset(&self, id_or_name: &str) -> Result<AssetQuote, ClaimError> {
        let asset = self
            .find_asset(id_or_name)?
            .ok_or_else(|| {
                tracing::info!(asset = %id_or_name, "stake asset not found");
                ClaimError::AssetNotFound(id_or_name.to_string())
            })?;
        if !asset.active {
            return Err(ClaimError::AssetNotActive(asset.asset_id.to_string()));
        }
        let amount = accrue(&asset, self.clock.now())?;
        let reward = self.rewards.get_reward(&asset.reward)?.ok_or_else(|| {
            tracing::info!(reward = %asset.reward, "stake reward not found");
            ClaimError::RewardNotFound(asset.reward.to_string())
        })?;

        tracing::info!(asset = %asset.asset_id, amount, "fetched asset reward");
        Ok(AssetQuote {
            asset_id: asset.asset_id,
            name: asset.name,
            reward_amount: amount,
            reward_asset_id: reward.asset_id,
            reward_name: reward.name,
            reward_decimals: reward.decimals,
        })
    }

    fn find_asset(&self, id_or_name: &str) -> Result<Option<StakeAsset>, ClaimError> {
        if id_or_name.is_empty() {
            return Ok(None);
        }
        if let Some(asset) = self.assets.get_asset(&AssetId::new(id_or_name))? {
            return Ok(Some(asset));
        }
        Ok(self.assets.find_asset_by_name(id_or_name)?)
    }
}
