use stakeclaim_types::{AssetId, ClaimStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("an open claim already exists for {0}")]
    OpenClaimExists(String),

    #[error("insufficient balance for {asset_id}: requested {requested}, available {available}")]
    InsufficientBalance {
        asset_id: AssetId,
        requested: u64,
        available: u64,
    },

    #[error("claim {session_id} is {found}, expected {expected}")]
    Conflict {
        session_id: String,
        expected: ClaimStatus,
        found: ClaimStatus,
    },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}
