//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::{LmdbAssetStore, LmdbClaimStore, LmdbError, LmdbMetaStore, LmdbRewardStore};

/// Names of every database this backend creates.
pub(crate) const DATABASES: &[&str] = &[
    "stake_assets",
    "stake_rewards",
    "stake_claims",
    "open_claims",
    "completed_claims",
    "meta",
];

/// Wraps the LMDB environment and all database handles.
///
/// Constructed once by the process entry point and handed to the stores;
/// dropping the last handle closes the environment.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) assets_db: Database<Bytes, Bytes>,
    pub(crate) rewards_db: Database<Bytes, Bytes>,
    pub(crate) claims_db: Database<Bytes, Bytes>,
    pub(crate) open_claims_db: Database<Bytes, Bytes>,
    pub(crate) completed_claims_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("create {}: {e}", path.display())))?;

        // SAFETY: the environment is opened once per process and the data
        // directory is not shared with other LMDB users.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(DATABASES.len() as u32)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let assets_db = env.create_database(&mut wtxn, Some("stake_assets"))?;
        let rewards_db = env.create_database(&mut wtxn, Some("stake_rewards"))?;
        let claims_db = env.create_database(&mut wtxn, Some("stake_claims"))?;
        let open_claims_db = env.create_database(&mut wtxn, Some("open_claims"))?;
        let completed_claims_db = env.create_database(&mut wtxn, Some("completed_claims"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            assets_db,
            rewards_db,
            claims_db,
            open_claims_db,
            completed_claims_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn asset_store(&self) -> LmdbAssetStore {
        LmdbAssetStore {
            env: self.env.clone(),
            assets_db: self.assets_db,
        }
    }

    pub fn reward_store(&self) -> LmdbRewardStore {
        LmdbRewardStore {
            env: self.env.clone(),
            rewards_db: self.rewards_db,
        }
    }

    pub fn claim_store(&self) -> LmdbClaimStore {
        LmdbClaimStore {
            env: self.env.clone(),
            claims_db: self.claims_db,
            open_claims_db: self.open_claims_db,
            completed_claims_db: self.completed_claims_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: self.env.clone(),
            meta_db: self.meta_db,
        }
    }
}
