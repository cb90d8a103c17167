//! Database metadata.

use crate::StoreError;

/// Schema version bookkeeping.
pub trait MetaStore {
    /// The stamped schema version; `None` for a database never stamped.
    fn schema_version(&self) -> Result<Option<u32>, StoreError>;

    fn stamp_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
