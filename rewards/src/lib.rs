//! Reward computation and reservation.
//!
//! - Time-prorated, capped accrual of stake-asset rewards
//! - Flat per-epoch delegator reward eligibility
//! - Balance reservation keeping `reserved <= balance` for every reward

pub mod calculator;
pub mod error;
pub mod reservation;

pub use calculator::{accrue, delegator_reward_amount};
pub use error::RewardError;
pub use reservation::BalanceReservationLedger;
