//! RPC request handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use stakeclaim_claims::{AssetQuote, ClaimRequest, ClaimView, RewardQuote};

use crate::server::RpcState;
use crate::RpcError;

/// Header carrying the operator key of `GET /rewards/{assetId}`.
pub const KEY_HEADER: &str = "key";

/// A successful answer: `{"success": true, ...body}`.
#[derive(Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Success<T> {
    fn new(body: T) -> Json<Self> {
        Json(Self {
            success: true,
            body,
        })
    }
}

// ── Requests ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RewardsRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub projects: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct ClaimQuery {
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub projects: Option<Vec<String>>,
    #[serde(default)]
    pub delegator_rewards: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    pub asset_rewards: Option<BTreeMap<String, u64>>,
}

fn non_empty(value: Option<String>, field: &str) -> Result<String, RpcError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RpcError::InvalidRequest(format!("missing {field}"))),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// `GET /rewards/{assetId}`
pub async fn asset_reward(
    State(state): State<Arc<RpcState>>,
    Path(asset_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Success<AssetQuote>>, RpcError> {
    let presented = headers.get(KEY_HEADER).and_then(|v| v.to_str().ok());
    if state.api_key.is_empty() || presented != Some(state.api_key.as_str()) {
        tracing::warn!(asset = %asset_id, "unauthorized asset reward request");
        return Err(RpcError::Unauthorized);
    }
    let quote = state.service.quote_asset(&asset_id)?;
    Ok(Success::new(quote))
}

/// `POST /rewards`
pub async fn rewards(
    State(state): State<Arc<RpcState>>,
    payload: Result<Json<RewardsRequest>, JsonRejection>,
) -> Result<Json<Success<RewardQuote>>, RpcError> {
    let Json(request) = payload.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let address = non_empty(request.address, "address")?;
    let quote = state
        .service
        .quote_rewards(&address, request.projects.as_deref())
        .await?;
    Ok(Success::new(quote))
}

/// `GET /claim?session=ID`
pub async fn get_claim(
    State(state): State<Arc<RpcState>>,
    query: Result<Query<ClaimQuery>, QueryRejection>,
) -> Result<Json<Success<ClaimView>>, RpcError> {
    let Query(query) = query.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let session = non_empty(query.session, "session")?;
    let view = state.service.get_session(&session)?;
    Ok(Success::new(view))
}

/// `POST /claim`
pub async fn create_claim(
    State(state): State<Arc<RpcState>>,
    payload: Result<Json<CreateClaimRequest>, JsonRejection>,
) -> Result<Json<Success<ClaimView>>, RpcError> {
    let Json(request) = payload.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let address = non_empty(request.address, "address")?;
    let (Some(delegator_rewards), Some(asset_rewards)) =
        (request.delegator_rewards, request.asset_rewards)
    else {
        return Err(RpcError::InvalidRequest("missing reward maps".into()));
    };

    let view = state
        .service
        .create_session(&ClaimRequest {
            address,
            projects: request.projects,
            delegator_rewards,
            asset_rewards,
        })
        .await?;
    Ok(Success::new(view))
}
