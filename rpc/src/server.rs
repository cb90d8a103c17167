//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use stakeclaim_claims::ClaimService;

use crate::handlers;
use crate::RpcError;

/// Shared state of every handler.
pub struct RpcState {
    pub service: Arc<ClaimService>,
    /// Operator key for `GET /rewards/{assetId}`; empty disables the route.
    pub api_key: String,
}

/// Build the router with every route and the CORS policy.
pub fn router(state: Arc<RpcState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            HeaderName::from_static("x-requested-with"),
            CONTENT_TYPE,
            HeaderName::from_static(handlers::KEY_HEADER),
        ]);

    Router::new()
        .route("/status", get(handlers::status))
        .route("/rewards/:asset_id", get(handlers::asset_reward))
        .route("/rewards", post(handlers::rewards))
        .route(
            "/claim",
            get(handlers::get_claim).post(handlers::create_claim),
        )
        .layer(cors)
        .with_state(state)
}

pub struct RpcServer {
    pub port: u16,
    pub state: Arc<RpcState>,
}

impl RpcServer {
    pub fn new(port: u16, state: Arc<RpcState>) -> Self {
        Self { port, state }
    }

    /// Serve until `shutdown` resolves.
    pub async fn start(
        &self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))?;
        tracing::info!(%addr, "RPC server listening");
        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
