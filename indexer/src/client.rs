//! HTTP client for the ledger-indexing service.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use stakeclaim_types::{Epoch, StakeAddress};

use crate::model::{AccountInfo, AssetHolder, AssetQuantity, EpochInfo, Lookup, PoolStake};
use crate::{IndexerError, LedgerIndexer, RetryPolicy};

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the indexer credential.
const PROJECT_ID_HEADER: &str = "project_id";

/// Client for a Blockfrost-compatible indexer.
///
/// Every request carries the `project_id` header and is bounded by the
/// configured timeout. Transient failures are retried per [`RetryPolicy`].
pub struct IndexerClient {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    base_url: String,
    project_id: String,
    retry: RetryPolicy,
}

impl IndexerClient {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, IndexerError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| IndexerError::RequestFailed(format!("building HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            retry,
        })
    }

    /// One GET without retrying. A 404 becomes [`Lookup::Absent`].
    async fn fetch_once<T: DeserializeOwned + Send>(
        &self,
        path: &str,
    ) -> Result<Lookup<T>, IndexerError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .get(&url)
            .header(PROJECT_ID_HEADER, &self.project_id)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IndexerError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    IndexerError::Unreachable(format!("connection failed: {e}"))
                } else {
                    IndexerError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Lookup::Absent);
        }
        if !status.is_success() {
            tracing::error!(path, status = status.as_u16(), "indexer request failed");
            return Err(IndexerError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.json::<T>().await.map_err(|e| {
            tracing::error!(path, error = %e, "indexer response could not be parsed");
            IndexerError::InvalidResponse(format!("{path}: {e}"))
        })?;
        Ok(Lookup::Found(body))
    }

    /// GET a single object, retrying transient failures.
    pub async fn get<T: DeserializeOwned + Send>(
        &self,
        path: &str,
    ) -> Result<Lookup<T>, IndexerError> {
        self.retry.run(path, || self.fetch_once::<T>(path)).await
    }

    /// GET every page of a paginated listing.
    ///
    /// Pages are requested from 1 until the first empty page. A 404 on the
    /// first page is [`Lookup::Absent`]; any failure on any page discards
    /// the pages collected so far.
    pub async fn get_all_pages<T: DeserializeOwned + Send>(
        &self,
        path: &str,
    ) -> Result<Lookup<Vec<T>>, IndexerError> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut page: u32 = 1;
        loop {
            let page_path = format!("{path}{separator}page={page}");
            match self.get::<Vec<T>>(&page_path).await? {
                Lookup::Absent if page == 1 => {
                    tracing::info!(path, "indexer reports entity does not exist");
                    return Ok(Lookup::Absent);
                }
                // Vanishing mid-listing leaves an incomplete result.
                Lookup::Absent => {
                    return Err(IndexerError::Status {
                        path: page_path,
                        status: 404,
                    });
                }
                Lookup::Found(batch) if batch.is_empty() => break,
                Lookup::Found(batch) => {
                    items.extend(batch);
                    page += 1;
                }
            }
        }
        tracing::debug!(path, pages = page - 1, items = items.len(), "fetched paginated listing");
        Ok(Lookup::Found(items))
    }
}

#[async_trait]
impl LedgerIndexer for IndexerClient {
    async fn latest_epoch(&self) -> Result<Lookup<EpochInfo>, IndexerError> {
        self.get("/epochs/latest").await
    }

    async fn account_info(
        &self,
        stake_address: &StakeAddress,
    ) -> Result<Lookup<AccountInfo>, IndexerError> {
        self.get(&format!("/accounts/{stake_address}")).await
    }

    async fn assets_for_stake_address(
        &self,
        stake_address: &StakeAddress,
    ) -> Result<Lookup<Vec<AssetQuantity>>, IndexerError> {
        self.get_all_pages(&format!("/accounts/{stake_address}/addresses/assets"))
            .await
    }

    async fn pool_stake_distribution(
        &self,
        epoch: Epoch,
        pool_id: &str,
    ) -> Result<Lookup<Vec<PoolStake>>, IndexerError> {
        self.get_all_pages(&format!("/epochs/{epoch}/stakes/{pool_id}"))
            .await
    }

    async fn asset_holders(&self, unit: &str) -> Result<Lookup<Vec<AssetHolder>>, IndexerError> {
        self.get(&format!("/assets/{unit}/addresses")).await
    }
}
