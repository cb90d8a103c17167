//! Claim session lifecycle: creation, invalidation and lookup.
//!
//! Every operation that touches the claims of a stake address runs under that
//! address's [`KeyedLocks`] entry. The store adds its own guarantees on top:
//! reservations are atomic over all assets of a session, status changes are
//! compare-and-set, and a second OPEN claim per address is refused.

use std::collections::BTreeMap;
use std::sync::Arc;

use stakeclaim_crypto::{derive_stake_address, generate_session_id, AddressInput};
use stakeclaim_indexer::{IndexerError, LedgerIndexer, Lookup};
use stakeclaim_rewards::BalanceReservationLedger;
use stakeclaim_store::{
    AssetAmounts, StakeAssetStore, StakeClaim, StakeClaimStore, StakeRewardStore, StoreError,
};
use stakeclaim_types::{format_display_amount, AssetId, ClaimStatus, Clock, StakeAddress};

use crate::calendar::CalendarBucket;
use crate::config::ServiceConfig;
use crate::locks::KeyedLocks;
use crate::view::ClaimView;
use crate::ClaimError;

/// Storage handles the service works against.
#[derive(Clone)]
pub struct Stores {
    pub assets: Arc<dyn StakeAssetStore>,
    pub rewards: Arc<dyn StakeRewardStore>,
    pub claims: Arc<dyn StakeClaimStore>,
}

/// Requested line items of a new claim session.
#[derive(Clone, Debug, Default)]
pub struct ClaimRequest {
    pub address: String,
    pub projects: Option<Vec<String>>,
    /// Reward asset id -> amount.
    pub delegator_rewards: BTreeMap<String, u64>,
    /// Stake asset id -> amount.
    pub asset_rewards: BTreeMap<String, u64>,
}

pub struct ClaimService {
    pub(crate) config: ServiceConfig,
    pub(crate) assets: Arc<dyn StakeAssetStore>,
    pub(crate) rewards: Arc<dyn StakeRewardStore>,
    pub(crate) claims: Arc<dyn StakeClaimStore>,
    pub(crate) ledger: BalanceReservationLedger,
    pub(crate) indexer: Arc<dyn LedgerIndexer>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) locks: KeyedLocks,
}

impl ClaimService {
    pub fn new(
        config: ServiceConfig,
        stores: Stores,
        indexer: Arc<dyn LedgerIndexer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = BalanceReservationLedger::new(stores.rewards.clone());
        Self {
            config,
            assets: stores.assets,
            rewards: stores.rewards,
            claims: stores.claims,
            ledger,
            indexer,
            clock,
            locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Resolve a handle or payment address to the wallet's stake address.
    pub async fn resolve_stake_address(&self, raw: &str) -> Result<StakeAddress, ClaimError> {
        let payment = match AddressInput::parse(raw) {
            AddressInput::Handle(handle) => {
                let lookup = self
                    .indexer
                    .resolve_handle(&self.config.handle_policy_id, &handle)
                    .await;
                match lookup {
                    Ok(Lookup::Found(address)) => address,
                    Ok(Lookup::Absent) => {
                        tracing::info!(handle = %handle, "handle has no holder");
                        return Err(ClaimError::InvalidAddress(format!("${handle}")));
                    }
                    Err(IndexerError::InvalidHandle(e)) => {
                        return Err(ClaimError::InvalidAddress(e));
                    }
                    Err(e) => {
                        tracing::error!(handle = %handle, error = %e, "handle lookup failed");
                        return Err(e.into());
                    }
                }
            }
            AddressInput::Payment(address) => address,
        };

        match derive_stake_address(&payment, self.config.network) {
            Ok(Some(stake_address)) => Ok(stake_address),
            Ok(None) => {
                tracing::info!(address = %payment, "address does not contain a stake key");
                Err(ClaimError::MissingStakeKey(payment.to_string()))
            }
            Err(e) => {
                tracing::info!(address = %payment, error = %e, "could not derive stake address");
                Err(ClaimError::InvalidAddress(e.to_string()))
            }
        }
    }

    /// Open a claim session for the requested line items.
    ///
    /// Eligibility is recomputed from scratch; the request is only trusted
    /// for what it asks for, never for what it is owed.
    pub async fn create_session(&self, request: &ClaimRequest) -> Result<ClaimView, ClaimError> {
        let stake_address = self.resolve_stake_address(&request.address).await?;
        let _guard = self.locks.lock(stake_address.as_str()).await;

        let quote = self
            .discover_locked(&stake_address, request.projects.as_deref())
            .await?;

        let mut assets = AssetAmounts::new();
        // reward name -> (raw sum, decimals)
        let mut readable: BTreeMap<String, (u64, u8)> = BTreeMap::new();
        let mut add = |asset_id: &AssetId, name: &str, decimals: u8, amount: u64| {
            let total = assets.entry(asset_id.clone()).or_insert(0);
            *total = total.saturating_add(amount);
            let entry = readable.entry(name.to_string()).or_insert((0, decimals));
            entry.0 = entry.0.saturating_add(amount);
        };

        for (key, &amount) in &request.delegator_rewards {
            let line = quote
                .delegator_rewards
                .iter()
                .find(|line| line.asset_id.as_str() == key)
                .ok_or_else(|| {
                    tracing::error!(stake = %stake_address, reward = %key, "requested delegator reward not on offer");
                    ClaimError::Evil(key.clone())
                })?;
            if amount > line.amount {
                tracing::error!(stake = %stake_address, reward = %key, amount, eligible = line.amount, "greedy request");
                return Err(ClaimError::Greedy {
                    key: key.clone(),
                    requested: amount,
                    eligible: line.amount,
                });
            }
            add(&line.asset_id, &line.name, line.decimals, amount);
        }

        for (key, &amount) in &request.asset_rewards {
            let line = quote
                .asset_rewards
                .iter()
                .find(|line| line.stake_asset_id.as_str() == key)
                .ok_or_else(|| {
                    tracing::error!(stake = %stake_address, asset = %key, "requested asset reward not on offer");
                    ClaimError::Evil(key.clone())
                })?;
            if amount > line.amount {
                tracing::error!(stake = %stake_address, asset = %key, amount, eligible = line.amount, "greedy request");
                return Err(ClaimError::Greedy {
                    key: key.clone(),
                    requested: amount,
                    eligible: line.amount,
                });
            }
            add(&line.asset_id, &line.name, line.decimals, amount);
        }

        assets.retain(|_, amount| *amount > 0);
        readable.retain(|_, (amount, _)| *amount > 0);
        if assets.is_empty() {
            return Err(ClaimError::NoRewardsRequested);
        }

        let payment_amount = self
            .config
            .fees
            .payment_amount(assets.len(), quote.service_fee);

        if self.claims.find_open_claim(&stake_address)?.is_some() {
            tracing::info!(stake = %stake_address, "open claim session already exists");
            return Err(ClaimError::DuplicateOpenSession(stake_address.to_string()));
        }

        let session_id =
            generate_session_id().map_err(|e| ClaimError::Internal(e.to_string()))?;

        self.ledger.reserve_all(&assets)?;

        if self.claims.find_open_claim(&stake_address)?.is_some() {
            tracing::error!(
                stake = %stake_address,
                "open claim session appeared after tokens were reserved"
            );
            return Err(ClaimError::DuplicateOpenSession(stake_address.to_string()));
        }

        let now = self.clock.now();
        let bucket = CalendarBucket::of(now);
        let claim = StakeClaim {
            session_id,
            stake_address: stake_address.clone(),
            status: ClaimStatus::Open,
            error: None,
            projects: request.projects.clone(),
            payment_address: self.config.payment_address.clone(),
            payment_amount,
            service_fee: quote.service_fee,
            expires_at: now.plus_secs(self.config.session_ttl_secs),
            assets,
            assets_readable: readable
                .into_iter()
                .map(|(name, (amount, decimals))| (name, format_display_amount(amount, decimals)))
                .collect(),
            delegator_rewards: request
                .delegator_rewards
                .iter()
                .map(|(k, v)| (AssetId::new(k.as_str()), *v))
                .collect(),
            asset_rewards: request
                .asset_rewards
                .iter()
                .filter(|(_, v)| **v > 0)
                .map(|(k, v)| (AssetId::new(k.as_str()), *v))
                .collect(),
            epoch: quote.epoch,
            month: bucket.month,
            quarter: bucket.quarter,
            year: bucket.year,
            payment_hash: None,
            action_hash: None,
            created_at: now,
            updated_at: now,
        };

        match self.claims.insert_claim(&claim) {
            Ok(()) => {}
            Err(StoreError::OpenClaimExists(_)) => {
                tracing::error!(
                    stake = %stake_address,
                    "open claim session appeared after tokens were reserved"
                );
                return Err(ClaimError::DuplicateOpenSession(stake_address.to_string()));
            }
            Err(e) => {
                if let Err(release) = self.ledger.release_all(&claim.assets) {
                    tracing::error!(error = %release, "could not release reservation of unsaved claim");
                }
                return Err(e.into());
            }
        }

        tracing::info!(
            session = %claim.session_id,
            stake = %stake_address,
            payment_amount,
            assets = claim.assets.len(),
            "created claim session"
        );
        Ok(ClaimView::from(&claim))
    }

    /// Invalidate the OPEN session of `stake_address`, releasing its
    /// reservation. Returns the invalidated session id, if there was one.
    pub async fn invalidate_open_session(
        &self,
        stake_address: &StakeAddress,
    ) -> Result<Option<String>, ClaimError> {
        let _guard = self.locks.lock(stake_address.as_str()).await;
        self.invalidate_open_locked(stake_address)
    }

    pub(crate) fn invalidate_open_locked(
        &self,
        stake_address: &StakeAddress,
    ) -> Result<Option<String>, ClaimError> {
        let Some(claim) = self.claims.find_open_claim(stake_address)? else {
            return Ok(None);
        };
        let claim = self.close_and_release(claim, ClaimStatus::Invalid, None)?;
        tracing::info!(session = %claim.session_id, stake = %stake_address, "claim session invalidated");
        Ok(Some(claim.session_id))
    }

    pub fn get_session(&self, session_id: &str) -> Result<ClaimView, ClaimError> {
        self.claims
            .get_claim(session_id)?
            .map(|claim| ClaimView::from(&claim))
            .ok_or_else(|| ClaimError::NotFound(format!("session {session_id}")))
    }

    /// Compare-and-set `claim` from `expected` to its current status.
    pub(crate) fn swap_status(
        &self,
        claim: &StakeClaim,
        expected: ClaimStatus,
    ) -> Result<(), ClaimError> {
        match self.claims.update_claim(claim, expected) {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict { found, .. }) => Err(ClaimError::InvalidTransition {
                session_id: claim.session_id.clone(),
                from: found,
                to: claim.status,
            }),
            Err(StoreError::NotFound(_)) => {
                Err(ClaimError::NotFound(format!("session {}", claim.session_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Move `claim` to `to`, then give its reservation back.
    ///
    /// The status change stands even when part of the reservation cannot be
    /// released; every amount left behind is logged.
    pub(crate) fn close_and_release(
        &self,
        mut claim: StakeClaim,
        to: ClaimStatus,
        error: Option<String>,
    ) -> Result<StakeClaim, ClaimError> {
        let from = claim.status;
        if !from.can_transition_to(to) {
            return Err(ClaimError::InvalidTransition {
                session_id: claim.session_id,
                from,
                to,
            });
        }
        claim.status = to;
        claim.updated_at = self.clock.now();
        if error.is_some() {
            claim.error = error;
        }
        self.swap_status(&claim, from)?;
        if let Err(e) = self.ledger.release_all(&claim.assets) {
            tracing::error!(session = %claim.session_id, error = %e, "releasing reservation asset by asset");
            for (asset_id, amount) in &claim.assets {
                if let Err(e) = self.ledger.release(asset_id, *amount) {
                    tracing::error!(
                        session = %claim.session_id,
                        asset = %asset_id,
                        amount,
                        error = %e,
                        "reservation left in place"
                    );
                }
            }
        }
        Ok(claim)
    }
}
