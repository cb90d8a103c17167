//! Parse errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("unknown claim status: {0}")]
    UnknownStatus(String),
}
