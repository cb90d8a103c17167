//! Claim session records.

use serde::{Deserialize, Serialize};
use stakeclaim_types::{ClaimStatus, Epoch, StakeAddress, Timestamp};
use std::collections::BTreeMap;

use crate::{AssetAmounts, StoreError};

/// One claim session.
///
/// `assets` is a snapshot taken at reservation time; it is never recomputed
/// from the live [`StakeReward`](crate::StakeReward) records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeClaim {
    /// Opaque, unguessable identifier. Doubles as the lookup token.
    pub session_id: String,
    pub stake_address: StakeAddress,
    pub status: ClaimStatus,
    pub error: Option<String>,
    /// Project filter the quote was computed with.
    pub projects: Option<Vec<String>>,
    /// Address the wallet pays the claim fee to.
    pub payment_address: String,
    pub payment_amount: u64,
    pub service_fee: u64,
    pub expires_at: Timestamp,
    /// Reserved raw amounts per reward asset.
    pub assets: AssetAmounts,
    /// Reserved amounts per reward name, formatted for display.
    pub assets_readable: BTreeMap<String, String>,
    /// Requested delegator line items, keyed by reward asset id.
    pub delegator_rewards: AssetAmounts,
    /// Requested per-asset line items, keyed by stake asset id.
    pub asset_rewards: AssetAmounts,
    pub epoch: Epoch,
    pub month: u32,
    pub quarter: u32,
    pub year: u32,
    pub payment_hash: Option<String>,
    pub action_hash: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Trait for claim session storage operations.
pub trait StakeClaimStore: Send + Sync {
    fn get_claim(&self, session_id: &str) -> Result<Option<StakeClaim>, StoreError>;

    /// The OPEN claim of a stake address, if any.
    fn find_open_claim(&self, stake_address: &StakeAddress)
        -> Result<Option<StakeClaim>, StoreError>;

    /// Whether the stake address has a COMPLETED claim created in `epoch`.
    fn has_completed_claim(
        &self,
        stake_address: &StakeAddress,
        epoch: Epoch,
    ) -> Result<bool, StoreError>;

    /// Persist a new claim.
    ///
    /// Fails with [`StoreError::Duplicate`] if the session id exists and with
    /// [`StoreError::OpenClaimExists`] if the claim is OPEN and the stake
    /// address already has an OPEN claim.
    fn insert_claim(&self, claim: &StakeClaim) -> Result<(), StoreError>;

    /// Overwrite a claim, provided its stored status is still `expected`.
    ///
    /// Fails with [`StoreError::Conflict`] otherwise; the caller lost a race.
    fn update_claim(&self, claim: &StakeClaim, expected: ClaimStatus) -> Result<(), StoreError>;

    /// Every claim currently OPEN.
    fn iter_open_claims(&self) -> Result<Vec<StakeClaim>, StoreError>;
}
