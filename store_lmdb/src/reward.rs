//! LMDB implementation of StakeRewardStore.
//!
//! `reserve`, `release` and `settle` read and rewrite every listed reward
//! inside one write transaction; an error drops the transaction uncommitted.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RwTxn};

use stakeclaim_store::{AssetAmounts, StakeReward, StakeRewardStore, StoreError};
use stakeclaim_types::AssetId;

use crate::{decode, encode, LmdbError};

pub struct LmdbRewardStore {
    pub(crate) env: Arc<Env>,
    pub(crate) rewards_db: Database<Bytes, Bytes>,
}

impl LmdbRewardStore {
    fn load(&self, wtxn: &RwTxn, asset_id: &AssetId) -> Result<StakeReward, StoreError> {
        let bytes = self
            .rewards_db
            .get(wtxn, asset_id.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(asset_id.to_string()))?;
        Ok(decode(bytes)?)
    }

    fn store_all(&self, wtxn: &mut RwTxn, rewards: &[StakeReward]) -> Result<(), StoreError> {
        for reward in rewards {
            let value = encode(reward)?;
            self.rewards_db
                .put(wtxn, reward.asset_id.as_str().as_bytes(), &value)
                .map_err(LmdbError::from)?;
        }
        Ok(())
    }
}

impl StakeRewardStore for LmdbRewardStore {
    fn get_reward(&self, asset_id: &AssetId) -> Result<Option<StakeReward>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .rewards_db
            .get(&rtxn, asset_id.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        Ok(bytes.map(decode::<StakeReward>).transpose()?)
    }

    fn put_reward(&self, reward: &StakeReward) -> Result<(), StoreError> {
        let value = encode(reward)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.rewards_db
            .put(&mut wtxn, reward.asset_id.as_str().as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn iter_rewards(&self) -> Result<Vec<StakeReward>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut rewards = Vec::new();
        for item in self.rewards_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, value) = item.map_err(LmdbError::from)?;
            rewards.push(decode(value)?);
        }
        Ok(rewards)
    }

    fn configure_reward(&self, reward: &StakeReward) -> Result<StakeReward, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let stored = match self.load(&wtxn, &reward.asset_id) {
            Ok(existing) => existing.reconfigured(reward)?,
            Err(StoreError::NotFound(_)) => reward.clone(),
            Err(e) => return Err(e),
        };
        self.store_all(&mut wtxn, std::slice::from_ref(&stored))?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(stored)
    }

    fn reserve(&self, amounts: &AssetAmounts) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut updated = Vec::with_capacity(amounts.len());
        for (asset_id, amount) in amounts {
            let mut reward = self.load(&wtxn, asset_id)?;
            let available = reward.available();
            if *amount > available {
                return Err(StoreError::InsufficientBalance {
                    asset_id: asset_id.clone(),
                    requested: *amount,
                    available,
                });
            }
            reward.reserved_balance += amount;
            updated.push(reward);
        }
        self.store_all(&mut wtxn, &updated)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn release(&self, amounts: &AssetAmounts) -> Result<Vec<(AssetId, u64)>, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut updated = Vec::with_capacity(amounts.len());
        let mut shortfalls = Vec::new();
        for (asset_id, amount) in amounts {
            let mut reward = self.load(&wtxn, asset_id)?;
            if reward.reserved_balance < *amount {
                shortfalls.push((asset_id.clone(), amount - reward.reserved_balance));
            }
            reward.reserved_balance = reward.reserved_balance.saturating_sub(*amount);
            updated.push(reward);
        }
        self.store_all(&mut wtxn, &updated)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(shortfalls)
    }

    fn settle(&self, amounts: &AssetAmounts) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut updated = Vec::with_capacity(amounts.len());
        for (asset_id, amount) in amounts {
            let mut reward = self.load(&wtxn, asset_id)?;
            reward.balance = reward.balance.saturating_sub(*amount);
            reward.reserved_balance = reward.reserved_balance.saturating_sub(*amount);
            reward.total_claims += 1;
            reward.total_claimed_amount = reward.total_claimed_amount.saturating_add(*amount);
            updated.push(reward);
        }
        self.store_all(&mut wtxn, &updated)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
