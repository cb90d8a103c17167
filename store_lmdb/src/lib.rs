//! LMDB storage backend for stakeclaim.
//!
//! Implements the repository traits from `stakeclaim-store` using the `heed`
//! LMDB bindings. Each logical store maps to one or more LMDB databases within
//! a single environment.
//!
//! LMDB admits one write transaction at a time, so every check-then-write
//! sequence that runs inside a single `write_txn` (reservation, OPEN-claim
//! uniqueness, status compare-and-set) is atomic across threads.

pub mod asset;
pub mod claim;
pub mod environment;
pub mod error;
pub mod integrity;
pub mod meta;
pub mod reward;

pub use asset::LmdbAssetStore;
pub use claim::LmdbClaimStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use meta::{ensure_schema_version, LmdbMetaStore, SCHEMA_VERSION};
pub use reward::LmdbRewardStore;

pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    bincode::serialize(value).map_err(|e| LmdbError::Serialization(e.to_string()))
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    bincode::deserialize(bytes).map_err(|e| LmdbError::Serialization(e.to_string()))
}
