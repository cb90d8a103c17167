//! LMDB implementation of StakeAssetStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use stakeclaim_store::{AssetAmounts, StakeAsset, StakeAssetStore, StoreError};
use stakeclaim_types::{AssetId, Timestamp};

use crate::{decode, encode, LmdbError};

pub struct LmdbAssetStore {
    pub(crate) env: Arc<Env>,
    pub(crate) assets_db: Database<Bytes, Bytes>,
}

impl StakeAssetStore for LmdbAssetStore {
    fn get_asset(&self, asset_id: &AssetId) -> Result<Option<StakeAsset>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .assets_db
            .get(&rtxn, asset_id.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        Ok(bytes.map(decode::<StakeAsset>).transpose()?)
    }

    fn find_asset_by_name(&self, name: &str) -> Result<Option<StakeAsset>, StoreError> {
        Ok(self.iter_assets()?.into_iter().find(|a| a.name == name))
    }

    fn put_asset(&self, asset: &StakeAsset) -> Result<(), StoreError> {
        let value = encode(asset)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.assets_db
            .put(&mut wtxn, asset.asset_id.as_str().as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn iter_assets(&self) -> Result<Vec<StakeAsset>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut assets = Vec::new();
        for item in self.assets_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, value) = item.map_err(LmdbError::from)?;
            assets.push(decode(value)?);
        }
        Ok(assets)
    }

    fn configure_asset(&self, asset: &StakeAsset) -> Result<StakeAsset, StoreError> {
        let key = asset.asset_id.as_str().as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let stored = match self.assets_db.get(&wtxn, key).map_err(LmdbError::from)? {
            Some(bytes) => decode::<StakeAsset>(bytes)?.reconfigured(asset),
            None => asset.clone(),
        };
        let value = encode(&stored)?;
        self.assets_db
            .put(&mut wtxn, key, &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(stored)
    }

    fn record_claims(&self, amounts: &AssetAmounts, at: Timestamp) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut updated = Vec::with_capacity(amounts.len());
        for (asset_id, amount) in amounts {
            let key = asset_id.as_str().as_bytes();
            let bytes = self
                .assets_db
                .get(&wtxn, key)
                .map_err(LmdbError::from)?
                .ok_or_else(|| StoreError::NotFound(asset_id.to_string()))?;
            let mut asset: StakeAsset = decode(bytes)?;
            asset.last_claim = at;
            asset.total_claims += 1;
            asset.total_claimed_amount = asset.total_claimed_amount.saturating_add(*amount);
            updated.push((key, encode(&asset)?));
        }
        for (key, value) in updated {
            self.assets_db
                .put(&mut wtxn, key, &value)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
