//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use stakeclaim_types::{AssetId, Network};

use crate::ClaimError;

/// Configuration for the claim service.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Network addresses must belong to.
    #[serde(default)]
    pub network: Network,

    /// Data directory for LMDB storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    /// RPC port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Shared secret expected in the `key` header of `GET /rewards/{assetId}`.
    /// Empty disables that route.
    #[serde(default)]
    pub api_key: String,

    /// Pool whose delegators get delegator rewards and pay no service fee.
    #[serde(default)]
    pub pool_id: String,

    /// Address wallets pay the claim fee to.
    #[serde(default)]
    pub payment_address: String,

    /// Minting policy of handle assets.
    #[serde(default = "default_handle_policy_id")]
    pub handle_policy_id: String,

    /// Policies whose assets accrue stake rewards.
    #[serde(default)]
    pub stake_asset_policy_ids: Vec<String>,

    /// Reward paying each pool delegator its active stake amount.
    #[serde(default)]
    pub pool_reward_asset: Option<AssetId>,

    /// Lifetime of an OPEN session.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// How often the daemon expires stale sessions; unset disables sweeping.
    #[serde(default)]
    pub expiry_sweep_secs: Option<u64>,

    #[serde(default)]
    pub indexer: IndexerSettings,

    #[serde(default)]
    pub fees: FeeConfig,
}

/// Connection settings for the ledger indexer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerSettings {
    pub base_url: String,
    pub project_id: String,
    pub timeout_secs: u64,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            base_url: "https://cardano-mainnet.blockfrost.io/api/v0".to_string(),
            project_id: String::new(),
            timeout_secs: 10,
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 5_000,
        }
    }
}

impl IndexerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Claim fee schedule, in lovelace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    pub base_fee: u64,
    /// Charged once per started batch of distinct reward assets.
    pub per_batch_fee: u64,
    pub batch_size: u64,
    /// Charged to wallets delegated to a pool other than ours.
    pub service_fee: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            base_fee: 2_000_000,
            per_batch_fee: 1_000_000,
            batch_size: 5,
            service_fee: 2_000_000,
        }
    }
}

impl FeeConfig {
    /// `base_fee + ceil(distinct_assets / batch_size) × per_batch_fee + service_fee`
    pub fn payment_amount(&self, distinct_assets: usize, service_fee: u64) -> u64 {
        let batches = (distinct_assets as u64).div_ceil(self.batch_size.max(1));
        self.base_fee
            .saturating_add(batches.saturating_mul(self.per_batch_fee))
            .saturating_add(service_fee)
    }
}

const REDACTED: &str = "<redacted>";

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./stakeclaim_data")
}

fn default_map_size() -> usize {
    1 << 30
}

fn default_rpc_port() -> u16 {
    8080
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_handle_policy_id() -> String {
    "f0ff48bbb7bbe9d59a40f1ce90e9e9d0ff5002ec48f232b49ca0fb9a".to_string()
}

fn default_session_ttl_secs() -> u64 {
    6 * 60 * 60
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ClaimError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ClaimError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ClaimError> {
        let config: Self = toml::from_str(s).map_err(|e| ClaimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ClaimError> {
        if self
            .stake_asset_policy_ids
            .iter()
            .any(|policy| policy.trim().is_empty())
        {
            return Err(ClaimError::Config(
                "stake_asset_policy_ids contains an empty policy id".into(),
            ));
        }
        if self.handle_policy_id.trim().is_empty() {
            return Err(ClaimError::Config("handle_policy_id is empty".into()));
        }
        Ok(())
    }

    /// Serialize with credentials masked, for display.
    pub fn to_redacted_toml_string(&self) -> Result<String, ClaimError> {
        let mut shown = self.clone();
        for secret in [&mut shown.api_key, &mut shown.indexer.project_id] {
            if !secret.is_empty() {
                *secret = REDACTED.to_string();
            }
        }
        shown.to_toml_string()
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ClaimError> {
        toml::to_string_pretty(self).map_err(|e| ClaimError::Config(e.to_string()))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            data_dir: default_data_dir(),
            lmdb_map_size: default_map_size(),
            rpc_port: default_rpc_port(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            api_key: String::new(),
            indexer: IndexerSettings::default(),
            pool_id: String::new(),
            payment_address: String::new(),
            handle_policy_id: default_handle_policy_id(),
            stake_asset_policy_ids: Vec::new(),
            pool_reward_asset: None,
            fees: FeeConfig::default(),
            session_ttl_secs: default_session_ttl_secs(),
            expiry_sweep_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ServiceConfig {
            pool_reward_asset: Some(AssetId::new("pool.reward")),
            expiry_sweep_secs: Some(60),
            ..ServiceConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ServiceConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.rpc_port, config.rpc_port);
        assert_eq!(parsed.fees, config.fees);
        assert_eq!(parsed.pool_reward_asset, config.pool_reward_asset);
        assert_eq!(parsed.expiry_sweep_secs, Some(60));
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_port, 8080);
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.session_ttl_secs, 21_600);
        assert_eq!(config.fees.base_fee, 2_000_000);
        assert_eq!(config.indexer.max_attempts, 3);
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            network = "testnet"
            pool_id = "pool1xyz"
            stake_asset_policy_ids = ["aa", "bb"]

            [fees]
            service_fee = 1000000

            [indexer]
            project_id = "secret"
        "#;
        let config = ServiceConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.pool_id, "pool1xyz");
        assert_eq!(config.stake_asset_policy_ids, vec!["aa", "bb"]);
        assert_eq!(config.fees.service_fee, 1_000_000);
        assert_eq!(config.fees.base_fee, 2_000_000);
        assert_eq!(config.indexer.project_id, "secret");
        assert_eq!(config.indexer.timeout_secs, 10);
    }

    #[test]
    fn empty_policy_id_is_rejected() {
        let result = ServiceConfig::from_toml_str(r#"stake_asset_policy_ids = ["aa", ""]"#);
        assert!(matches!(result, Err(ClaimError::Config(_))));

        let config = ServiceConfig {
            stake_asset_policy_ids: vec![" ".into()],
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn redacted_toml_masks_credentials() {
        let config = ServiceConfig {
            api_key: "operator-secret".into(),
            pool_id: "pool1xyz".into(),
            indexer: IndexerSettings {
                project_id: "mainnetABC".into(),
                ..IndexerSettings::default()
            },
            ..ServiceConfig::default()
        };
        let shown = config.to_redacted_toml_string().unwrap();
        assert!(!shown.contains("operator-secret"));
        assert!(!shown.contains("mainnetABC"));
        assert!(shown.contains("pool1xyz"));
        assert!(shown.contains("<redacted>"));
        assert_eq!(config.api_key, "operator-secret");
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ServiceConfig::from_toml_file("/nonexistent/stakeclaim.toml");
        assert!(matches!(result, Err(ClaimError::Config(_))));
    }

    #[test]
    fn payment_amount_batches_by_five() {
        let fees = FeeConfig::default();
        assert_eq!(fees.payment_amount(1, 0), 3_000_000);
        assert_eq!(fees.payment_amount(5, 0), 3_000_000);
        assert_eq!(fees.payment_amount(6, 0), 4_000_000);
        assert_eq!(fees.payment_amount(11, 2_000_000), 7_000_000);
    }
}
