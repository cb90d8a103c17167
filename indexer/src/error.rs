use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("indexer returned HTTP {status} for {path}")]
    Status { path: String, status: u16 },

    #[error("invalid response from indexer: {0}")]
    InvalidResponse(String),

    #[error("indexer unreachable: {0}")]
    Unreachable(String),

    #[error("indexer request failed: {0}")]
    RequestFailed(String),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("invalid handle: {0}")]
    InvalidHandle(String),
}

impl IndexerError {
    /// Whether another attempt may succeed.
    ///
    /// Server errors, rate limiting and transport failures are transient.
    /// Everything else, including unparseable bodies, is final.
    pub fn is_transient(&self) -> bool {
        match self {
            IndexerError::Status { status, .. } => *status >= 500 || *status == 429,
            IndexerError::Unreachable(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let status = |s| IndexerError::Status {
            path: "/x".into(),
            status: s,
        };
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(403).is_transient());
        assert!(IndexerError::Unreachable("refused".into()).is_transient());
        assert!(!IndexerError::InvalidResponse("eof".into()).is_transient());
    }
}
