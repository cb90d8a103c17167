//! Fundamental types for the stakeclaim service.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, asset identifiers, amounts, timestamps, network ids, and the claim
//! lifecycle enum.

pub mod address;
pub mod amount;
pub mod asset;
pub mod error;
pub mod network;
pub mod status;
pub mod time;

pub use address::{PaymentAddress, StakeAddress};
pub use amount::format_display_amount;
pub use asset::AssetId;
pub use error::TypeError;
pub use network::Network;
pub use status::ClaimStatus;
pub use time::{Clock, SystemClock, Timestamp};

/// Ledger epoch number.
pub type Epoch = u64;
