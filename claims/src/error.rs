//! Claim service errors.
//!
//! Every variant maps to a stable, user-facing message via
//! [`ClaimError::user_message`]. Internal detail stays in the `Display`
//! output, which is only logged.

use stakeclaim_indexer::IndexerError;
use stakeclaim_rewards::RewardError;
use stakeclaim_store::StoreError;
use stakeclaim_types::ClaimStatus;
use thiserror::Error;

const MSG_INVALID_ADDRESS: &str = "Please enter a valid payment address or handle";
const MSG_NOT_DELEGATED: &str = "Your wallet must be delegated to any pool in order to claim rewards. When staking with our pool you can claim rewards without paying a service fee.";
const MSG_INSUFFICIENT_BALANCE: &str = "Oh, we don't have enough tokens to send your rewards. Please contact the project for which you want to claim rewards.";
const MSG_INTERNAL: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown session or handle.
    #[error("{0} not found")]
    NotFound(String),

    /// Unknown stake asset in a single-asset quote.
    #[error("stake asset {0} not found")]
    AssetNotFound(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("address {0} does not contain a stake key")]
    MissingStakeKey(String),

    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("account {0} is not delegated")]
    NotDelegated(String),

    #[error("stake asset {0} is not active")]
    AssetNotActive(String),

    #[error("reward {0} not found")]
    RewardNotFound(String),

    #[error("calculation error: {0}")]
    Calculation(String),

    /// Requested a line item that is not on offer.
    #[error("requested unknown reward {0}")]
    Evil(String),

    /// Requested more than is on offer.
    #[error("requested {requested} of {key}, eligible {eligible}")]
    Greedy {
        key: String,
        requested: u64,
        eligible: u64,
    },

    #[error("no rewards requested")]
    NoRewardsRequested,

    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("open claim session exists for {0}")]
    DuplicateOpenSession(String),

    #[error("wallet {0} does not qualify for any rewards")]
    NoEligibleRewards(String),

    /// `message` is shown to the caller, `detail` only logged.
    #[error("{message}: {detail}")]
    ExternalService { message: String, detail: String },

    #[error("claim {session_id} cannot move from {from} to {to}")]
    InvalidTransition {
        session_id: String,
        from: ClaimStatus,
        to: ClaimStatus,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClaimError {
    pub(crate) fn external(message: &str, detail: impl ToString) -> Self {
        ClaimError::ExternalService {
            message: message.to_string(),
            detail: detail.to_string(),
        }
    }

    /// Message safe to return to API callers.
    pub fn user_message(&self) -> &str {
        match self {
            ClaimError::InvalidRequest(_) => "Invalid Request",
            ClaimError::NotFound(_) => "Not found",
            ClaimError::AssetNotFound(_) => "Not Found",
            ClaimError::InvalidAddress(_) => MSG_INVALID_ADDRESS,
            ClaimError::MissingStakeKey(_) => "Address does not contain a stake key",
            ClaimError::AccountNotFound(_) => "Could not query account info",
            ClaimError::NotDelegated(_) => MSG_NOT_DELEGATED,
            ClaimError::AssetNotActive(_) => "Asset Not Active",
            ClaimError::RewardNotFound(_) => "Reward Not Found",
            ClaimError::Calculation(_) => "Calculation Error",
            ClaimError::Evil(_) => "Don't be evil",
            ClaimError::Greedy { .. } => "Don't be greedy",
            ClaimError::NoRewardsRequested => "No rewards requested",
            ClaimError::InsufficientBalance(_) => MSG_INSUFFICIENT_BALANCE,
            ClaimError::DuplicateOpenSession(_) => {
                "There is already an open claim session for your wallet"
            }
            ClaimError::NoEligibleRewards(_) => "Your wallet does not qualify for any rewards",
            ClaimError::ExternalService { message, .. } => message,
            ClaimError::InvalidTransition { .. } => "Invalid Request",
            ClaimError::Config(_) | ClaimError::Store(_) | ClaimError::Internal(_) => MSG_INTERNAL,
        }
    }

    /// Whether the error is a fault of ours rather than of the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ClaimError::Config(_) | ClaimError::Store(_) | ClaimError::Internal(_)
        )
    }
}

impl From<RewardError> for ClaimError {
    fn from(e: RewardError) -> Self {
        match e {
            RewardError::InsufficientBalance { .. } => ClaimError::InsufficientBalance(e.to_string()),
            RewardError::RewardNotFound(id) => ClaimError::RewardNotFound(id),
            RewardError::Calculation { .. } => ClaimError::Calculation(e.to_string()),
            RewardError::Store(e) => ClaimError::Store(e),
        }
    }
}

impl From<IndexerError> for ClaimError {
    fn from(e: IndexerError) -> Self {
        ClaimError::external("Something went wrong, please try again later", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let e = ClaimError::Store(StoreError::Backend("mdb_put: MDB_MAP_FULL".into()));
        assert_eq!(e.user_message(), "Internal Server Error");
        assert!(e.is_internal());
    }

    #[test]
    fn external_errors_show_context_only() {
        let e = ClaimError::external("Could not query latest epoch", "HTTP 502 for /epochs/latest");
        assert_eq!(e.user_message(), "Could not query latest epoch");
        assert!(!e.is_internal());
    }

    #[test]
    fn greedy_and_evil_messages() {
        let greedy = ClaimError::Greedy {
            key: "p.01".into(),
            requested: 2,
            eligible: 1,
        };
        assert_eq!(greedy.user_message(), "Don't be greedy");
        assert_eq!(ClaimError::Evil("x".into()).user_message(), "Don't be evil");
    }
}
