//! Nullable store: thread-safe in-memory storage for testing.
//!
//! One mutex guards every table, so each trait call observes and mutates a
//! consistent snapshot, matching the single-writer LMDB backend.

use stakeclaim_store::{
    AssetAmounts, MetaStore, StakeAsset, StakeAssetStore, StakeClaim, StakeClaimStore,
    StakeReward, StakeRewardStore, StoreError,
};
use stakeclaim_types::{AssetId, ClaimStatus, Epoch, StakeAddress, Timestamp};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    assets: BTreeMap<AssetId, StakeAsset>,
    rewards: BTreeMap<AssetId, StakeReward>,
    claims: BTreeMap<String, StakeClaim>,
    schema_version: Option<u32>,
}

impl Tables {
    fn open_claim_of(&self, stake_address: &StakeAddress) -> Option<&StakeClaim> {
        self.claims
            .values()
            .find(|c| c.status == ClaimStatus::Open && &c.stake_address == stake_address)
    }
}

/// An in-memory asset + reward + claim store for testing.
pub struct NullStore {
    tables: Mutex<Tables>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Every claim ever inserted, in session id order.
    pub fn all_claims(&self) -> Vec<StakeClaim> {
        self.tables.lock().unwrap().claims.values().cloned().collect()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StakeAssetStore for NullStore {
    fn get_asset(&self, asset_id: &AssetId) -> Result<Option<StakeAsset>, StoreError> {
        Ok(self.tables.lock().unwrap().assets.get(asset_id).cloned())
    }

    fn find_asset_by_name(&self, name: &str) -> Result<Option<StakeAsset>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .assets
            .values()
            .find(|a| a.name == name)
            .cloned())
    }

    fn put_asset(&self, asset: &StakeAsset) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .assets
            .insert(asset.asset_id.clone(), asset.clone());
        Ok(())
    }

    fn iter_assets(&self) -> Result<Vec<StakeAsset>, StoreError> {
        Ok(self.tables.lock().unwrap().assets.values().cloned().collect())
    }

    fn configure_asset(&self, asset: &StakeAsset) -> Result<StakeAsset, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let stored = match tables.assets.get(&asset.asset_id) {
            Some(existing) => existing.reconfigured(asset),
            None => asset.clone(),
        };
        tables.assets.insert(stored.asset_id.clone(), stored.clone());
        Ok(stored)
    }

    fn record_claims(&self, amounts: &AssetAmounts, at: Timestamp) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(missing) = amounts.keys().find(|id| !tables.assets.contains_key(*id)) {
            return Err(StoreError::NotFound(missing.to_string()));
        }
        for (asset_id, amount) in amounts {
            if let Some(asset) = tables.assets.get_mut(asset_id) {
                asset.last_claim = at;
                asset.total_claims += 1;
                asset.total_claimed_amount = asset.total_claimed_amount.saturating_add(*amount);
            }
        }
        Ok(())
    }
}

impl StakeRewardStore for NullStore {
    fn get_reward(&self, asset_id: &AssetId) -> Result<Option<StakeReward>, StoreError> {
        Ok(self.tables.lock().unwrap().rewards.get(asset_id).cloned())
    }

    fn put_reward(&self, reward: &StakeReward) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .rewards
            .insert(reward.asset_id.clone(), reward.clone());
        Ok(())
    }

    fn iter_rewards(&self) -> Result<Vec<StakeReward>, StoreError> {
        Ok(self.tables.lock().unwrap().rewards.values().cloned().collect())
    }

    fn configure_reward(&self, reward: &StakeReward) -> Result<StakeReward, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let stored = match tables.rewards.get(&reward.asset_id) {
            Some(existing) => existing.reconfigured(reward)?,
            None => reward.clone(),
        };
        tables.rewards.insert(stored.asset_id.clone(), stored.clone());
        Ok(stored)
    }

    fn reserve(&self, amounts: &AssetAmounts) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        for (asset_id, amount) in amounts {
            let reward = tables
                .rewards
                .get(asset_id)
                .ok_or_else(|| StoreError::NotFound(asset_id.to_string()))?;
            if *amount > reward.available() {
                return Err(StoreError::InsufficientBalance {
                    asset_id: asset_id.clone(),
                    requested: *amount,
                    available: reward.available(),
                });
            }
        }
        for (asset_id, amount) in amounts {
            if let Some(reward) = tables.rewards.get_mut(asset_id) {
                reward.reserved_balance += amount;
            }
        }
        Ok(())
    }

    fn release(&self, amounts: &AssetAmounts) -> Result<Vec<(AssetId, u64)>, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(missing) = amounts.keys().find(|id| !tables.rewards.contains_key(*id)) {
            return Err(StoreError::NotFound(missing.to_string()));
        }
        let mut shortfalls = Vec::new();
        for (asset_id, amount) in amounts {
            if let Some(reward) = tables.rewards.get_mut(asset_id) {
                if reward.reserved_balance < *amount {
                    shortfalls.push((asset_id.clone(), amount - reward.reserved_balance));
                }
                reward.reserved_balance = reward.reserved_balance.saturating_sub(*amount);
            }
        }
        Ok(shortfalls)
    }

    fn settle(&self, amounts: &AssetAmounts) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(missing) = amounts.keys().find(|id| !tables.rewards.contains_key(*id)) {
            return Err(StoreError::NotFound(missing.to_string()));
        }
        for (asset_id, amount) in amounts {
            if let Some(reward) = tables.rewards.get_mut(asset_id) {
                reward.balance = reward.balance.saturating_sub(*amount);
                reward.reserved_balance = reward.reserved_balance.saturating_sub(*amount);
                reward.total_claims += 1;
                reward.total_claimed_amount = reward.total_claimed_amount.saturating_add(*amount);
            }
        }
        Ok(())
    }
}

impl StakeClaimStore for NullStore {
    fn get_claim(&self, session_id: &str) -> Result<Option<StakeClaim>, StoreError> {
        Ok(self.tables.lock().unwrap().claims.get(session_id).cloned())
    }

    fn find_open_claim(
        &self,
        stake_address: &StakeAddress,
    ) -> Result<Option<StakeClaim>, StoreError> {
        Ok(self.tables.lock().unwrap().open_claim_of(stake_address).cloned())
    }

    fn has_completed_claim(
        &self,
        stake_address: &StakeAddress,
        epoch: Epoch,
    ) -> Result<bool, StoreError> {
        Ok(self.tables.lock().unwrap().claims.values().any(|c| {
            c.status == ClaimStatus::Completed && &c.stake_address == stake_address && c.epoch == epoch
        }))
    }

    fn insert_claim(&self, claim: &StakeClaim) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.claims.contains_key(&claim.session_id) {
            return Err(StoreError::Duplicate(claim.session_id.clone()));
        }
        if claim.status == ClaimStatus::Open && tables.open_claim_of(&claim.stake_address).is_some() {
            return Err(StoreError::OpenClaimExists(claim.stake_address.to_string()));
        }
        tables.claims.insert(claim.session_id.clone(), claim.clone());
        Ok(())
    }

    fn update_claim(&self, claim: &StakeClaim, expected: ClaimStatus) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let found = tables
            .claims
            .get(&claim.session_id)
            .map(|c| c.status)
            .ok_or_else(|| StoreError::NotFound(claim.session_id.clone()))?;
        if found != expected {
            return Err(StoreError::Conflict {
                session_id: claim.session_id.clone(),
                expected,
                found,
            });
        }
        if claim.status == ClaimStatus::Open
            && found != ClaimStatus::Open
            && tables.open_claim_of(&claim.stake_address).is_some()
        {
            return Err(StoreError::OpenClaimExists(claim.stake_address.to_string()));
        }
        tables.claims.insert(claim.session_id.clone(), claim.clone());
        Ok(())
    }

    fn iter_open_claims(&self) -> Result<Vec<StakeClaim>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .claims
            .values()
            .filter(|c| c.status == ClaimStatus::Open)
            .cloned()
            .collect())
    }
}

impl MetaStore for NullStore {
    fn schema_version(&self) -> Result<Option<u32>, StoreError> {
        Ok(self.tables.lock().unwrap().schema_version)
    }

    fn stamp_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.tables.lock().unwrap().schema_version = Some(version);
        Ok(())
    }
}
