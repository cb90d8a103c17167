//! Record schemas and repository traits for stakeclaim.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod asset;
pub mod claim;
pub mod error;
pub mod meta;
pub mod reward;

pub use asset::{StakeAsset, StakeAssetStore};
pub use claim::{StakeClaim, StakeClaimStore};
pub use error::StoreError;
pub use meta::MetaStore;
pub use reward::{StakeReward, StakeRewardStore};

use stakeclaim_types::AssetId;
use std::collections::BTreeMap;

/// Raw token amounts keyed by asset identifier.
pub type AssetAmounts = BTreeMap<AssetId, u64>;
