//! Bookkeeping for the payout process.
//!
//! The transfer itself happens elsewhere; these operations record its
//! progress and move reserved balances accordingly.

use stakeclaim_store::StakeClaim;
use stakeclaim_types::{ClaimStatus, Timestamp};

use crate::service::ClaimService;
use crate::view::ClaimView;
use crate::ClaimError;

impl ClaimService {
    /// Load a claim and lock its stake address. The claim is re-read under
    /// the lock.
    async fn locked_claim(
        &self,
        session_id: &str,
    ) -> Result<(StakeClaim, tokio::sync::OwnedMutexGuard<()>), ClaimError> {
        let not_found = || ClaimError::NotFound(format!("session {session_id}"));
        let claim = self.claims.get_claim(session_id)?.ok_or_else(not_found)?;
        let guard = self.locks.lock(claim.stake_address.as_str()).await;
        let claim = self.claims.get_claim(session_id)?.ok_or_else(not_found)?;
        Ok((claim, guard))
    }

    /// The wallet paid: OPEN → PROCESSING.
    pub async fn begin_processing(
        &self,
        session_id: &str,
        payment_hash: &str,
    ) -> Result<ClaimView, ClaimError> {
        let (mut claim, _guard) = self.locked_claim(session_id).await?;
        let from = claim.status;
        if !from.can_transition_to(ClaimStatus::Processing) {
            return Err(ClaimError::InvalidTransition {
                session_id: claim.session_id,
                from,
                to: ClaimStatus::Processing,
            });
        }
        claim.status = ClaimStatus::Processing;
        claim.payment_hash = Some(payment_hash.to_string());
        claim.updated_at = self.clock.now();
        self.swap_status(&claim, from)?;

        tracing::info!(session = %claim.session_id, payment_hash, "claim session processing");
        Ok(ClaimView::from(&claim))
    }

    /// The payout went through: PROCESSING → COMPLETED.
    ///
    /// Reserved tokens leave the reward balances and every claimed stake
    /// asset starts accruing again from now.
    pub async fn complete_session(
        &self,
        session_id: &str,
        action_hash: &str,
    ) -> Result<ClaimView, ClaimError> {
        let (mut claim, _guard) = self.locked_claim(session_id).await?;
        let from = claim.status;
        if !from.can_transition_to(ClaimStatus::Completed) {
            return Err(ClaimError::InvalidTransition {
                session_id: claim.session_id,
                from,
                to: ClaimStatus::Completed,
            });
        }
        let now = self.clock.now();
        claim.status = ClaimStatus::Completed;
        claim.action_hash = Some(action_hash.to_string());
        claim.updated_at = now;
        self.swap_status(&claim, from)?;

        if let Err(e) = self.ledger.settle_all(&claim.assets) {
            tracing::error!(session = %claim.session_id, error = %e, "could not settle completed claim");
            return Err(e.into());
        }
        if let Err(e) = self.assets.record_claims(&claim.asset_rewards, now) {
            tracing::error!(session = %claim.session_id, error = %e, "could not record claimed assets");
            return Err(e.into());
        }

        tracing::info!(session = %claim.session_id, action_hash, "claim session completed");
        Ok(ClaimView::from(&claim))
    }

    /// The payout failed: OPEN or PROCESSING → ERROR, reservation released.
    pub async fn fail_session(
        &self,
        session_id: &str,
        error: &str,
    ) -> Result<ClaimView, ClaimError> {
        let (claim, _guard) = self.locked_claim(session_id).await?;
        let claim = self.close_and_release(claim, ClaimStatus::Error, Some(error.to_string()))?;
        tracing::warn!(session = %claim.session_id, error, "claim session failed");
        Ok(ClaimView::from(&claim))
    }

    /// Expire every OPEN session whose expiry lies before `now`.
    ///
    /// Returns the number of sessions expired. Sessions that changed state
    /// concurrently are skipped.
    pub async fn expire_sessions(&self, now: Timestamp) -> Result<usize, ClaimError> {
        let mut expired = 0;
        for stale in self.claims.iter_open_claims()? {
            if !stale.expires_at.is_before(now) {
                continue;
            }
            let _guard = self.locks.lock(stale.stake_address.as_str()).await;
            let Some(claim) = self.claims.get_claim(&stale.session_id)? else {
                continue;
            };
            if claim.status != ClaimStatus::Open || !claim.expires_at.is_before(now) {
                continue;
            }
            match self.close_and_release(claim, ClaimStatus::Expired, None) {
                Ok(claim) => {
                    tracing::info!(session = %claim.session_id, stake = %claim.stake_address, "claim session expired");
                    expired += 1;
                }
                Err(ClaimError::InvalidTransition { session_id, from, .. }) => {
                    tracing::debug!(session = %session_id, status = %from, "session changed before expiry");
                }
                Err(e) => return Err(e),
            }
        }
        if expired > 0 {
            tracing::info!(expired, "expired stale claim sessions");
        }
        Ok(expired)
    }
}
