//! Nullable ledger indexer: scripted ledger facts for testing.

use async_trait::async_trait;
use stakeclaim_indexer::{
    AccountInfo, AssetHolder, AssetQuantity, EpochInfo, IndexerError, LedgerIndexer, Lookup,
    PoolStake,
};
use stakeclaim_types::{Epoch, StakeAddress};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Ledger {
    epoch: Epoch,
    /// stake address -> delegated pool (None = registered but undelegated)
    accounts: HashMap<String, Option<String>>,
    holdings: HashMap<String, Vec<AssetQuantity>>,
    /// pool id -> active stake of its delegators
    pool_stakes: HashMap<String, Vec<PoolStake>>,
    holders: HashMap<String, Vec<AssetHolder>>,
    /// HTTP status every request fails with while set.
    failure: Option<u16>,
}

/// A scripted [`LedgerIndexer`].
///
/// Unknown accounts, pools and asset units are reported as absent, the way
/// the real service answers 404. A known account without holdings has an
/// empty asset list.
pub struct NullIndexer {
    ledger: Mutex<Ledger>,
    calls: AtomicU32,
}

impl NullIndexer {
    pub fn new(epoch: Epoch) -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                epoch,
                ..Ledger::default()
            }),
            calls: AtomicU32::new(0),
        }
    }

    pub fn set_epoch(&self, epoch: Epoch) {
        self.ledger.lock().unwrap().epoch = epoch;
    }

    /// Register an account, delegated to `pool_id` or undelegated.
    pub fn set_account(&self, stake_address: &str, pool_id: Option<&str>) {
        self.ledger
            .lock()
            .unwrap()
            .accounts
            .insert(stake_address.to_string(), pool_id.map(str::to_string));
    }

    pub fn add_holding(&self, stake_address: &str, unit: &str, quantity: u64) {
        self.ledger
            .lock()
            .unwrap()
            .holdings
            .entry(stake_address.to_string())
            .or_default()
            .push(AssetQuantity {
                unit: unit.to_string(),
                quantity: quantity.to_string(),
            });
    }

    pub fn add_pool_stake(&self, pool_id: &str, stake_address: &str, amount: u64) {
        self.ledger
            .lock()
            .unwrap()
            .pool_stakes
            .entry(pool_id.to_string())
            .or_default()
            .push(PoolStake {
                stake_address: stake_address.to_string(),
                amount: amount.to_string(),
            });
    }

    /// Make `address` the holder of the asset `unit`.
    pub fn set_asset_holder(&self, unit: &str, address: &str) {
        self.ledger.lock().unwrap().holders.insert(
            unit.to_string(),
            vec![AssetHolder {
                address: address.to_string(),
            }],
        );
    }

    /// Fail every subsequent request with `status` until cleared.
    pub fn fail_with(&self, status: Option<u16>) {
        self.ledger.lock().unwrap().failure = status;
    }

    /// Number of requests served so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self, path: String) -> Result<std::sync::MutexGuard<'_, Ledger>, IndexerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ledger = self.ledger.lock().unwrap();
        match ledger.failure {
            Some(status) => Err(IndexerError::Status { path, status }),
            None => Ok(ledger),
        }
    }
}

#[async_trait]
impl LedgerIndexer for NullIndexer {
    async fn latest_epoch(&self) -> Result<Lookup<EpochInfo>, IndexerError> {
        let ledger = self.begin("/epochs/latest".into())?;
        Ok(Lookup::Found(EpochInfo {
            epoch: ledger.epoch,
        }))
    }

    async fn account_info(
        &self,
        stake_address: &StakeAddress,
    ) -> Result<Lookup<AccountInfo>, IndexerError> {
        let ledger = self.begin(format!("/accounts/{stake_address}"))?;
        Ok(match ledger.accounts.get(stake_address.as_str()) {
            Some(pool_id) => Lookup::Found(AccountInfo {
                pool_id: pool_id.clone(),
            }),
            None => Lookup::Absent,
        })
    }

    async fn assets_for_stake_address(
        &self,
        stake_address: &StakeAddress,
    ) -> Result<Lookup<Vec<AssetQuantity>>, IndexerError> {
        let ledger = self.begin(format!("/accounts/{stake_address}/addresses/assets"))?;
        if !ledger.accounts.contains_key(stake_address.as_str()) {
            return Ok(Lookup::Absent);
        }
        Ok(Lookup::Found(
            ledger
                .holdings
                .get(stake_address.as_str())
                .cloned()
                .unwrap_or_default(),
        ))
    }

    async fn pool_stake_distribution(
        &self,
        epoch: Epoch,
        pool_id: &str,
    ) -> Result<Lookup<Vec<PoolStake>>, IndexerError> {
        let ledger = self.begin(format!("/epochs/{epoch}/stakes/{pool_id}"))?;
        Ok(match ledger.pool_stakes.get(pool_id) {
            Some(stakes) => Lookup::Found(stakes.clone()),
            None => Lookup::Absent,
        })
    }

    async fn asset_holders(&self, unit: &str) -> Result<Lookup<Vec<AssetHolder>>, IndexerError> {
        let ledger = self.begin(format!("/assets/{unit}/addresses"))?;
        Ok(match ledger.holders.get(unit) {
            Some(holders) => Lookup::Found(holders.clone()),
            None => Lookup::Absent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_account_is_absent() {
        let indexer = NullIndexer::new(1);
        let stake = StakeAddress::new("stake1x");
        assert!(indexer.account_info(&stake).await.unwrap().is_absent());
        assert!(indexer.assets_for_stake_address(&stake).await.unwrap().is_absent());

        indexer.set_account("stake1x", None);
        let info = indexer.account_info(&stake).await.unwrap().found().unwrap();
        assert_eq!(info.pool_id, None);
        let held = indexer.assets_for_stake_address(&stake).await.unwrap();
        assert_eq!(held, Lookup::Found(vec![]));
        assert_eq!(indexer.calls(), 4);
    }

    #[tokio::test]
    async fn scripted_failure_applies_to_every_request() {
        let indexer = NullIndexer::new(1);
        indexer.fail_with(Some(500));
        assert!(indexer.latest_epoch().await.is_err());
        indexer.fail_with(None);
        assert_eq!(indexer.latest_epoch().await.unwrap().found().unwrap().epoch, 1);
    }
}
