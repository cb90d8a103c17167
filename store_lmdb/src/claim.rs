//! LMDB implementation of StakeClaimStore.
//!
//! Besides the primary `stake_claims` database (session id -> claim) two
//! indices are maintained in the same write transaction as the claim:
//!
//! - `open_claims`: stake address -> session id of its OPEN claim
//! - `completed_claims`: stake address ++ 0x00 ++ epoch (BE) -> session id

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use stakeclaim_store::{StakeClaim, StakeClaimStore, StoreError};
use stakeclaim_types::{ClaimStatus, Epoch, StakeAddress};

use crate::{decode, encode, LmdbError};

pub struct LmdbClaimStore {
    pub(crate) env: Arc<Env>,
    pub(crate) claims_db: Database<Bytes, Bytes>,
    pub(crate) open_claims_db: Database<Bytes, Bytes>,
    pub(crate) completed_claims_db: Database<Bytes, Bytes>,
}

fn completed_key(stake_address: &StakeAddress, epoch: Epoch) -> Vec<u8> {
    let addr = stake_address.as_str().as_bytes();
    let mut key = Vec::with_capacity(addr.len() + 9);
    key.extend_from_slice(addr);
    key.push(0);
    key.extend_from_slice(&epoch.to_be_bytes());
    key
}

impl LmdbClaimStore {
    fn read_claim(&self, txn: &RoTxn, session_id: &str) -> Result<Option<StakeClaim>, StoreError> {
        let bytes = self
            .claims_db
            .get(txn, session_id.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(bytes.map(decode::<StakeClaim>).transpose()?)
    }

    fn open_session_for(
        &self,
        txn: &RoTxn,
        stake_address: &StakeAddress,
    ) -> Result<Option<String>, StoreError> {
        let bytes = self
            .open_claims_db
            .get(txn, stake_address.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        bytes
            .map(|b| {
                String::from_utf8(b.to_vec())
                    .map_err(|e| StoreError::Corruption(format!("open claim index: {e}")))
            })
            .transpose()
    }
}

impl StakeClaimStore for LmdbClaimStore {
    fn get_claim(&self, session_id: &str) -> Result<Option<StakeClaim>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.read_claim(&rtxn, session_id)
    }

    fn find_open_claim(
        &self,
        stake_address: &StakeAddress,
    ) -> Result<Option<StakeClaim>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self.open_session_for(&rtxn, stake_address)? {
            Some(session_id) => match self.read_claim(&rtxn, &session_id)? {
                Some(claim) => Ok(Some(claim)),
                None => Err(StoreError::Corruption(format!(
                    "open claim index points at missing session {session_id}"
                ))),
            },
            None => Ok(None),
        }
    }

    fn has_completed_claim(
        &self,
        stake_address: &StakeAddress,
        epoch: Epoch,
    ) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = completed_key(stake_address, epoch);
        Ok(self
            .completed_claims_db
            .get(&rtxn, &key)
            .map_err(LmdbError::from)?
            .is_some())
    }

    fn insert_claim(&self, claim: &StakeClaim) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        if self.read_claim(&wtxn, &claim.session_id)?.is_some() {
            return Err(StoreError::Duplicate(claim.session_id.clone()));
        }
        if claim.status == ClaimStatus::Open
            && self.open_session_for(&wtxn, &claim.stake_address)?.is_some()
        {
            return Err(StoreError::OpenClaimExists(
                claim.stake_address.as_str().to_string(),
            ));
        }

        let value = encode(claim)?;
        self.claims_db
            .put(&mut wtxn, claim.session_id.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        match claim.status {
            ClaimStatus::Open => {
                self.open_claims_db
                    .put(
                        &mut wtxn,
                        claim.stake_address.as_str().as_bytes(),
                        claim.session_id.as_bytes(),
                    )
                    .map_err(LmdbError::from)?;
            }
            ClaimStatus::Completed => {
                self.completed_claims_db
                    .put(
                        &mut wtxn,
                        &completed_key(&claim.stake_address, claim.epoch),
                        claim.session_id.as_bytes(),
                    )
                    .map_err(LmdbError::from)?;
            }
            _ => {}
        }

        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn update_claim(&self, claim: &StakeClaim, expected: ClaimStatus) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let stored = self
            .read_claim(&wtxn, &claim.session_id)?
            .ok_or_else(|| StoreError::NotFound(claim.session_id.clone()))?;
        if stored.status != expected {
            return Err(StoreError::Conflict {
                session_id: claim.session_id.clone(),
                expected,
                found: stored.status,
            });
        }

        let addr_key = claim.stake_address.as_str().as_bytes();
        if stored.status == ClaimStatus::Open && claim.status != ClaimStatus::Open {
            self.open_claims_db
                .delete(&mut wtxn, addr_key)
                .map_err(LmdbError::from)?;
        }
        if claim.status == ClaimStatus::Open && stored.status != ClaimStatus::Open {
            if self.open_session_for(&wtxn, &claim.stake_address)?.is_some() {
                return Err(StoreError::OpenClaimExists(
                    claim.stake_address.as_str().to_string(),
                ));
            }
            self.open_claims_db
                .put(&mut wtxn, addr_key, claim.session_id.as_bytes())
                .map_err(LmdbError::from)?;
        }
        if claim.status == ClaimStatus::Completed {
            self.completed_claims_db
                .put(
                    &mut wtxn,
                    &completed_key(&claim.stake_address, claim.epoch),
                    claim.session_id.as_bytes(),
                )
                .map_err(LmdbError::from)?;
        }

        let value = encode(claim)?;
        self.claims_db
            .put(&mut wtxn, claim.session_id.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn iter_open_claims(&self) -> Result<Vec<StakeClaim>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut claims = Vec::new();
        for item in self.open_claims_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, session_id) = item.map_err(LmdbError::from)?;
            let session_id = String::from_utf8(session_id.to_vec())
                .map_err(|e| StoreError::Corruption(format!("open claim index: {e}")))?;
            if let Some(claim) = self.read_claim(&rtxn, &session_id)? {
                claims.push(claim);
            }
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use stakeclaim_types::Timestamp;
    use std::collections::BTreeMap;

    fn claim(session_id: &str, stake: &str, status: ClaimStatus) -> StakeClaim {
        StakeClaim {
            session_id: session_id.into(),
            stake_address: StakeAddress::new(stake),
            status,
            error: None,
            projects: None,
            payment_address: "addr_pay".into(),
            payment_amount: 3_000_000,
            service_fee: 0,
            expires_at: Timestamp::new(21_600),
            assets: BTreeMap::new(),
            assets_readable: BTreeMap::new(),
            delegator_rewards: BTreeMap::new(),
            asset_rewards: BTreeMap::new(),
            epoch: 420,
            month: 70,
            quarter: 24,
            year: 5,
            payment_hash: None,
            action_hash: None,
            created_at: Timestamp::new(0),
            updated_at: Timestamp::new(0),
        }
    }

    fn open() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        (dir, env)
    }

    #[test]
    fn second_open_claim_for_same_stake_is_rejected() {
        let (_dir, env) = open();
        let store = env.claim_store();
        store.insert_claim(&claim("s1", "stake1", ClaimStatus::Open)).unwrap();

        let err = store
            .insert_claim(&claim("s2", "stake1", ClaimStatus::Open))
            .unwrap_err();
        assert!(matches!(err, StoreError::OpenClaimExists(_)));
        store.insert_claim(&claim("s3", "stake2", ClaimStatus::Open)).unwrap();

        let found = store.find_open_claim(&StakeAddress::new("stake1")).unwrap().unwrap();
        assert_eq!(found.session_id, "s1");
        assert_eq!(store.iter_open_claims().unwrap().len(), 2);
    }

    #[test]
    fn duplicate_session_id_is_rejected() {
        let (_dir, env) = open();
        let store = env.claim_store();
        store.insert_claim(&claim("s1", "stake1", ClaimStatus::Open)).unwrap();
        let err = store
            .insert_claim(&claim("s1", "stake2", ClaimStatus::Open))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn update_is_compare_and_set_on_status() {
        let (_dir, env) = open();
        let store = env.claim_store();
        let mut c = claim("s1", "stake1", ClaimStatus::Open);
        store.insert_claim(&c).unwrap();

        c.status = ClaimStatus::Invalid;
        store.update_claim(&c, ClaimStatus::Open).unwrap();
        assert!(store.find_open_claim(&StakeAddress::new("stake1")).unwrap().is_none());

        let err = store.update_claim(&c, ClaimStatus::Open).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict { found: ClaimStatus::Invalid, .. }
        ));

        // OPEN slot is free again.
        store.insert_claim(&claim("s2", "stake1", ClaimStatus::Open)).unwrap();
    }

    #[test]
    fn completed_claims_are_indexed_by_epoch() {
        let (_dir, env) = open();
        let store = env.claim_store();
        let stake = StakeAddress::new("stake1");
        let mut c = claim("s1", "stake1", ClaimStatus::Open);
        store.insert_claim(&c).unwrap();
        assert!(!store.has_completed_claim(&stake, 420).unwrap());

        c.status = ClaimStatus::Processing;
        store.update_claim(&c, ClaimStatus::Open).unwrap();
        c.status = ClaimStatus::Completed;
        store.update_claim(&c, ClaimStatus::Processing).unwrap();

        assert!(store.has_completed_claim(&stake, 420).unwrap());
        assert!(!store.has_completed_claim(&stake, 421).unwrap());
        assert!(!store
            .has_completed_claim(&StakeAddress::new("stake1x"), 420)
            .unwrap());
    }

    #[test]
    fn update_of_missing_claim_is_not_found() {
        let (_dir, env) = open();
        let store = env.claim_store();
        let err = store
            .update_claim(&claim("nope", "stake1", ClaimStatus::Invalid), ClaimStatus::Open)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn concurrent_open_inserts_admit_one() {
        let (_dir, env) = open();
        let store = Arc::new(env.claim_store());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .insert_claim(&claim(&format!("s{i}"), "stake1", ClaimStatus::Open))
                        .is_ok()
                })
            })
            .collect();
        let ok = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(ok, 1);
    }
}
