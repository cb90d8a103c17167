//! Schema version stamp kept in the `meta` database.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use stakeclaim_store::{MetaStore, StoreError};

use crate::LmdbError;

const SCHEMA_KEY: &[u8] = b"schema";

/// Schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

pub struct LmdbMetaStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl MetaStore for LmdbMetaStore {
    fn schema_version(&self) -> Result<Option<u32>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let Some(bytes) = self.meta_db.get(&rtxn, SCHEMA_KEY).map_err(LmdbError::from)? else {
            return Ok(None);
        };
        let bytes: [u8; 4] = bytes
            .try_into()
            .map_err(|_| LmdbError::Serialization(format!("schema stamp of {} bytes", bytes.len())))?;
        Ok(Some(u32::from_be_bytes(bytes)))
    }

    fn stamp_schema_version(&self, version: u32) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_KEY, &version.to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

/// Stamp a fresh database with [`SCHEMA_VERSION`], or check an existing
/// stamp. Any other version is refused.
pub fn ensure_schema_version(meta: &impl MetaStore) -> Result<(), LmdbError> {
    match meta.schema_version()? {
        None => {
            meta.stamp_schema_version(SCHEMA_VERSION)?;
            tracing::info!(version = SCHEMA_VERSION, "stamped fresh database");
            Ok(())
        }
        Some(SCHEMA_VERSION) => Ok(()),
        Some(found) => Err(LmdbError::SchemaMismatch {
            found,
            expected: SCHEMA_VERSION,
        }),
    }
}
