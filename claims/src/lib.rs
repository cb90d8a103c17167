//! Claim sessions for stake rewards.
//!
//! [`ClaimService`] discovers what a wallet may claim, turns a request into
//! an OPEN session with reserved balances, and records the session's way to
//! a terminal state.

pub mod calendar;
pub mod config;
pub mod error;
pub mod locks;
pub mod quote;
pub mod service;
pub mod settlement;
pub mod view;

pub use calendar::CalendarBucket;
pub use config::{FeeConfig, IndexerSettings, ServiceConfig};
pub use error::ClaimError;
pub use locks::KeyedLocks;
pub use service::{ClaimRequest, ClaimService, Stores};
pub use view::{AssetQuote, AssetRewardLine, ClaimView, DelegatorRewardLine, RewardQuote};
