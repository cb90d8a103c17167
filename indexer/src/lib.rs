//! Ledger-indexer access for stakeclaim.
//!
//! [`LedgerIndexer`] is the seam the claim service depends on;
//! [`IndexerClient`] implements it over HTTP, and the nullables crate
//! provides a scripted implementation for tests.

pub mod client;
pub mod error;
pub mod model;
pub mod retry;

pub use client::IndexerClient;
pub use error::IndexerError;
pub use model::{AccountInfo, AssetHolder, AssetQuantity, EpochInfo, Lookup, PoolStake};
pub use retry::RetryPolicy;

use async_trait::async_trait;
use stakeclaim_types::{Epoch, PaymentAddress, StakeAddress};

/// Read-only ledger facts.
#[async_trait]
pub trait LedgerIndexer: Send + Sync {
    async fn latest_epoch(&self) -> Result<Lookup<EpochInfo>, IndexerError>;

    async fn account_info(
        &self,
        stake_address: &StakeAddress,
    ) -> Result<Lookup<AccountInfo>, IndexerError>;

    /// Every asset held by any address of the account, all pages.
    async fn assets_for_stake_address(
        &self,
        stake_address: &StakeAddress,
    ) -> Result<Lookup<Vec<AssetQuantity>>, IndexerError>;

    /// Active stake of every delegator of `pool_id` in `epoch`, all pages.
    async fn pool_stake_distribution(
        &self,
        epoch: Epoch,
        pool_id: &str,
    ) -> Result<Lookup<Vec<PoolStake>>, IndexerError>;

    async fn asset_holders(&self, unit: &str) -> Result<Lookup<Vec<AssetHolder>>, IndexerError>;

    /// Resolve a handle (without the leading `$`) to the payment address
    /// holding its asset under `policy_id`.
    ///
    /// The first listed holder wins. No holders, or a 404, is `Absent`.
    async fn resolve_handle(
        &self,
        policy_id: &str,
        handle: &str,
    ) -> Result<Lookup<PaymentAddress>, IndexerError> {
        let unit = stakeclaim_crypto::handle_unit(policy_id, handle)
            .map_err(|e| IndexerError::InvalidHandle(e.to_string()))?;
        let holders = self.asset_holders(&unit).await?;
        Ok(match holders {
            Lookup::Found(holders) => match holders.into_iter().next() {
                Some(holder) => Lookup::Found(PaymentAddress::new(holder.address)),
                None => Lookup::Absent,
            },
            Lookup::Absent => Lookup::Absent,
        })
    }
}
