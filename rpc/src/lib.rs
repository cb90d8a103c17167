//! HTTP JSON API for the claim service.
//!
//! Provides endpoints for:
//! - Service status
//! - Single-asset reward quotes (operator key required)
//! - Wallet reward quotes
//! - Claim session creation and lookup
//!
//! Domain outcomes, including failures, are answered with HTTP 200 and a
//! `success` flag.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcServer, RpcState};
