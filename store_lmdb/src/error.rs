use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database schema version {found}, expected {expected}")]
    SchemaMismatch { found: u32, expected: u32 },

    #[error(transparent)]
    Store(#[from] stakeclaim_store::StoreError),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<LmdbError> for stakeclaim_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => stakeclaim_store::StoreError::NotFound(key),
            LmdbError::Serialization(msg) => stakeclaim_store::StoreError::Serialization(msg),
            LmdbError::Store(e) => e,
            other => stakeclaim_store::StoreError::Backend(other.to_string()),
        }
    }
}
