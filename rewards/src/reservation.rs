//! Balance reservation ledger.
//!
//! Wraps a [`StakeRewardStore`] and records every change to reserved
//! balances. Each call maps to one atomic store operation, so concurrent
//! callers can never push `reserved_balance` above `balance`.

use std::collections::BTreeMap;
use std::sync::Arc;

use stakeclaim_store::{AssetAmounts, StakeRewardStore};
use stakeclaim_types::AssetId;

use crate::RewardError;

pub struct BalanceReservationLedger {
    store: Arc<dyn StakeRewardStore>,
}

impl BalanceReservationLedger {
    pub fn new(store: Arc<dyn StakeRewardStore>) -> Self {
        Self { store }
    }

    /// Reserve `amount` of a single reward asset.
    pub fn reserve(&self, asset_id: &AssetId, amount: u64) -> Result<(), RewardError> {
        self.reserve_all(&single(asset_id, amount))
    }

    /// Reserve every listed amount, or none of them.
    pub fn reserve_all(&self, amounts: &AssetAmounts) -> Result<(), RewardError> {
        if let Err(e) = self.store.reserve(amounts) {
            let e = RewardError::from(e);
            tracing::warn!(error = %e, "reservation rejected");
            return Err(e);
        }
        for (asset_id, amount) in amounts {
            tracing::info!(asset = %asset_id, amount, "reserved reward tokens");
        }
        Ok(())
    }

    pub fn release(&self, asset_id: &AssetId, amount: u64) -> Result<(), RewardError> {
        self.release_all(&single(asset_id, amount))
    }

    /// Give back every listed amount.
    ///
    /// Releasing more than is reserved clamps at zero and is logged as an
    /// invariant violation; it is not an error for the caller.
    pub fn release_all(&self, amounts: &AssetAmounts) -> Result<(), RewardError> {
        let shortfalls = self.store.release(amounts)?;
        for (asset_id, missing) in &shortfalls {
            tracing::error!(
                asset = %asset_id,
                missing,
                "released more tokens than were reserved"
            );
        }
        for (asset_id, amount) in amounts {
            tracing::info!(asset = %asset_id, amount, "released reserved tokens");
        }
        Ok(())
    }

    /// Turn a reservation into a payout: balance and reservation both shrink.
    pub fn settle_all(&self, amounts: &AssetAmounts) -> Result<(), RewardError> {
        self.store.settle(amounts)?;
        for (asset_id, amount) in amounts {
            tracing::info!(asset = %asset_id, amount, "settled reward tokens");
        }
        Ok(())
    }
}

fn single(asset_id: &AssetId, amount: u64) -> AssetAmounts {
    BTreeMap::from([(asset_id.clone(), amount)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakeclaim_nullables::NullStore;
    use stakeclaim_store::StakeReward;

    fn reward(id: &str, balance: u64) -> StakeReward {
        StakeReward {
            asset_id: AssetId::new(id),
            decimals: 6,
            name: id.to_uppercase(),
            description: None,
            image: None,
            url: None,
            active: true,
            exclusive: false,
            balance,
            reserved_balance: 0,
            delegator_reward: false,
            delegator_reward_amount_per_epoch: 0,
            total_claims: 0,
            total_claimed_amount: 0,
        }
    }

    fn setup() -> (Arc<NullStore>, BalanceReservationLedger) {
        let store = Arc::new(NullStore::new());
        store.put_reward(&reward("a", 100)).unwrap();
        store.put_reward(&reward("b", 20)).unwrap();
        let ledger = BalanceReservationLedger::new(store.clone());
        (store, ledger)
    }

    fn reserved(store: &NullStore, id: &str) -> u64 {
        store
            .get_reward(&AssetId::new(id))
            .unwrap()
            .unwrap()
            .reserved_balance
    }

    #[test]
    fn reserve_and_release_single_asset() {
        let (store, ledger) = setup();
        ledger.reserve(&AssetId::new("a"), 60).unwrap();
        assert_eq!(reserved(&store, "a"), 60);

        let err = ledger.reserve(&AssetId::new("a"), 41).unwrap_err();
        assert!(matches!(
            err,
            RewardError::InsufficientBalance { requested: 41, available: 40, .. }
        ));

        ledger.release(&AssetId::new("a"), 60).unwrap();
        assert_eq!(reserved(&store, "a"), 0);
    }

    #[test]
    fn reserve_all_leaves_nothing_behind_on_failure() {
        let (store, ledger) = setup();
        let amounts: AssetAmounts = [(AssetId::new("a"), 10), (AssetId::new("b"), 21)]
            .into_iter()
            .collect();
        assert!(ledger.reserve_all(&amounts).is_err());
        assert_eq!(reserved(&store, "a"), 0);
        assert_eq!(reserved(&store, "b"), 0);
    }

    #[test]
    fn unknown_reward_is_reported() {
        let (_, ledger) = setup();
        let err = ledger.reserve(&AssetId::new("zz"), 1).unwrap_err();
        assert!(matches!(err, RewardError::RewardNotFound(_)));
    }

    #[test]
    fn over_release_clamps_at_zero() {
        let (store, ledger) = setup();
        ledger.reserve(&AssetId::new("b"), 5).unwrap();
        ledger.release(&AssetId::new("b"), 9).unwrap();
        assert_eq!(reserved(&store, "b"), 0);
    }

    #[test]
    fn settle_reduces_balance_and_reservation() {
        let (store, ledger) = setup();
        ledger.reserve(&AssetId::new("a"), 30).unwrap();
        ledger.settle_all(&single(&AssetId::new("a"), 30)).unwrap();
        let r = store.get_reward(&AssetId::new("a")).unwrap().unwrap();
        assert_eq!((r.balance, r.reserved_balance), (70, 0));
        assert_eq!(r.total_claimed_amount, 30);
    }
}
