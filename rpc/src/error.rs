//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use stakeclaim_claims::ClaimError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("unauthorized request")]
    Unauthorized,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    /// Message safe to show the caller.
    pub fn user_message(&self) -> &str {
        match self {
            RpcError::Unauthorized => "Unauthorized",
            RpcError::InvalidRequest(_) => "Invalid Request",
            RpcError::Claim(e) => e.user_message(),
            RpcError::Server(_) => "Internal Server Error",
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        match &self {
            RpcError::Unauthorized => return StatusCode::UNAUTHORIZED.into_response(),
            RpcError::Claim(e) if e.is_internal() => {
                tracing::error!(error = %e, "request failed");
            }
            RpcError::Server(e) => tracing::error!(error = %e, "request failed"),
            other => tracing::debug!(error = %other, "request rejected"),
        }
        Json(json!({ "success": false, "message": self.user_message() })).into_response()
    }
}
