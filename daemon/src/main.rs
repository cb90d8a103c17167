//! stakeclaim daemon: entry point for running the claim service.

mod import;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;

use stakeclaim_claims::{ClaimService, ClaimView, ServiceConfig, Stores};
use stakeclaim_indexer::{IndexerClient, RetryPolicy};
use stakeclaim_rpc::{RpcServer, RpcState};
use stakeclaim_store_lmdb::integrity::{check_data_dir, check_integrity};
use stakeclaim_store_lmdb::{ensure_schema_version, LmdbEnvironment};
use stakeclaim_types::{Clock, Network, SystemClock};
use stakeclaim_utils::{format_duration, init_logging, LogFormat};

use crate::import::SeedFile;
use crate::shutdown::ShutdownController;

#[derive(Parser)]
#[command(name = "stakeclaim-daemon", about = "Stake reward claim service")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "STAKECLAIM_CONFIG")]
    config: Option<PathBuf>,

    /// Network addresses must belong to: "mainnet" or "testnet".
    #[arg(long, env = "STAKECLAIM_NETWORK")]
    network: Option<String>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "STAKECLAIM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// HTTP API port.
    #[arg(long, env = "STAKECLAIM_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STAKECLAIM_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STAKECLAIM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Operator key for `GET /rewards/{assetId}`.
    #[arg(long, env = "STAKECLAIM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the ledger indexer.
    #[arg(long, env = "STAKECLAIM_INDEXER_URL")]
    indexer_url: Option<String>,

    /// Indexer credential, sent as the `project_id` header.
    #[arg(long, env = "STAKECLAIM_INDEXER_PROJECT_ID", hide_env_values = true)]
    indexer_project_id: Option<String>,

    /// Pool whose delegators pay no service fee.
    #[arg(long, env = "STAKECLAIM_POOL_ID")]
    pool_id: Option<String>,

    /// Address wallets pay the claim fee to.
    #[arg(long, env = "STAKECLAIM_PAYMENT_ADDRESS")]
    payment_address: Option<String>,

    /// Tracked stake asset policies (comma-separated).
    #[arg(long, env = "STAKECLAIM_STAKE_ASSET_POLICY_IDS", value_delimiter = ',')]
    stake_asset_policy_ids: Vec<String>,

    /// Expire stale sessions every N seconds.
    #[arg(long, env = "STAKECLAIM_EXPIRY_SWEEP_SECS")]
    expiry_sweep_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Run,
    /// Expire stale claim sessions once and exit.
    ExpireSessions,
    /// Print the effective configuration as TOML, credentials masked.
    PrintConfig,
    /// Insert or update stake rewards and stake assets from a TOML file.
    Import {
        /// File of `[[rewards]]` and `[[assets]]` tables.
        file: PathBuf,
    },
    /// Record payout progress of a claim session.
    Settle {
        #[command(subcommand)]
        step: SettleStep,
    },
}

#[derive(clap::Subcommand)]
enum SettleStep {
    /// The fee was paid: OPEN to PROCESSING.
    Begin { session: String, payment_hash: String },
    /// The payout went through: PROCESSING to COMPLETED.
    Complete { session: String, action_hash: String },
    /// The payout failed: the session moves to ERROR and its reservation is released.
    Fail { session: String, error: String },
}

fn load_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            ServiceConfig::from_toml_file(&path)
                .with_context(|| format!("loading config file {path}"))?
        }
        None => ServiceConfig::default(),
    };
    apply_overrides(cli, &mut config)?;
    config.validate()?;
    Ok(config)
}

fn apply_overrides(cli: &Cli, config: &mut ServiceConfig) -> anyhow::Result<()> {
    if let Some(network) = &cli.network {
        config.network = network.parse::<Network>()?;
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(port) = cli.rpc_port {
        config.rpc_port = port;
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(key) = &cli.api_key {
        config.api_key = key.clone();
    }
    if let Some(url) = &cli.indexer_url {
        config.indexer.base_url = url.clone();
    }
    if let Some(project_id) = &cli.indexer_project_id {
        config.indexer.project_id = project_id.clone();
    }
    if let Some(pool_id) = &cli.pool_id {
        config.pool_id = pool_id.clone();
    }
    if let Some(address) = &cli.payment_address {
        config.payment_address = address.clone();
    }
    if !cli.stake_asset_policy_ids.is_empty() {
        config.stake_asset_policy_ids = cli.stake_asset_policy_ids.clone();
    }
    if cli.expiry_sweep_secs.is_some() {
        config.expiry_sweep_secs = cli.expiry_sweep_secs;
    }
    Ok(())
}

/// Open LMDB, verify it and stamp or check its schema version.
fn open_storage(config: &ServiceConfig) -> anyhow::Result<LmdbEnvironment> {
    check_data_dir(&config.data_dir).map_err(anyhow::Error::msg)?;
    let env = LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)
        .with_context(|| format!("opening LMDB at {}", config.data_dir.display()))?;

    let report = check_integrity(env.env())?;
    if !report.is_healthy() {
        bail!("database integrity check failed: {}", report.errors.join("; "));
    }
    tracing::info!(
        databases = report.databases_checked,
        entries = report.total_entries,
        "database integrity check passed"
    );
    ensure_schema_version(&env.meta_store())?;
    Ok(env)
}

fn open_service(config: &ServiceConfig) -> anyhow::Result<ClaimService> {
    let env = open_storage(config)?;
    wire_service(config, &env)
}

fn wire_service(config: &ServiceConfig, env: &LmdbEnvironment) -> anyhow::Result<ClaimService> {
    let settings = &config.indexer;
    let indexer = IndexerClient::new(
        settings.base_url.clone(),
        settings.project_id.clone(),
        settings.timeout(),
        RetryPolicy {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
        },
    )?;
    if settings.project_id.is_empty() {
        tracing::warn!("indexer project id is empty; requests will likely be rejected");
    }

    let stores = Stores {
        assets: Arc::new(env.asset_store()),
        rewards: Arc::new(env.reward_store()),
        claims: Arc::new(env.claim_store()),
    };
    Ok(ClaimService::new(
        config.clone(),
        stores,
        Arc::new(indexer),
        Arc::new(SystemClock),
    ))
}

/// Periodically expire stale sessions until shutdown.
fn spawn_expiry_sweeper(
    service: Arc<ClaimService>,
    every: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = service.expire_sessions(SystemClock.now()).await {
                        tracing::error!(error = %e, "expiry sweep failed");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    if config.api_key.is_empty() {
        tracing::warn!("no API key configured; GET /rewards/{{assetId}} is disabled");
    }
    let service = Arc::new(open_service(&config)?);
    let controller = Arc::new(ShutdownController::new());

    let sweeper = config.expiry_sweep_secs.filter(|secs| *secs > 0).map(|secs| {
        tracing::info!(every = %format_duration(secs), "expiry sweeper enabled");
        spawn_expiry_sweeper(
            service.clone(),
            Duration::from_secs(secs),
            controller.subscribe(),
        )
    });

    let server = RpcServer::new(
        config.rpc_port,
        Arc::new(RpcState {
            service,
            api_key: config.api_key.clone(),
        }),
    );
    let mut http_shutdown = controller.subscribe();
    let signals = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.wait_for_signal().await })
    };

    tracing::info!(
        network = config.network.as_str(),
        port = config.rpc_port,
        session_ttl = %format_duration(config.session_ttl_secs),
        "starting stakeclaim"
    );
    let served = server
        .start(async move {
            let _ = http_shutdown.recv().await;
        })
        .await;

    controller.shutdown();
    signals.abort();
    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }
    served?;
    tracing::info!("stakeclaim daemon exited cleanly");
    Ok(())
}

async fn expire_once(config: ServiceConfig) -> anyhow::Result<()> {
    let service = open_service(&config)?;
    let expired = service.expire_sessions(SystemClock.now()).await?;
    tracing::info!(expired, "expiry run finished");
    Ok(())
}

fn import(config: &ServiceConfig, file: &std::path::Path) -> anyhow::Result<()> {
    let seed = SeedFile::load(file)?;
    let env = open_storage(config)?;
    let summary = seed.apply(&env.asset_store(), &env.reward_store(), SystemClock.now())?;
    tracing::info!(
        rewards = summary.rewards,
        assets = summary.assets,
        file = %file.display(),
        "import finished"
    );
    Ok(())
}

async fn settle(service: &ClaimService, step: SettleStep) -> anyhow::Result<ClaimView> {
    let view = match step {
        SettleStep::Begin {
            session,
            payment_hash,
        } => service.begin_processing(&session, &payment_hash).await?,
        SettleStep::Complete {
            session,
            action_hash,
        } => service.complete_session(&session, &action_hash).await?,
        SettleStep::Fail { session, error } => service.fail_session(&session, &error).await?,
    };
    Ok(view)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(LogFormat::from_name(&config.log_format), &config.log_level);

    match cli.command {
        Command::Run => run(config).await,
        Command::ExpireSessions => expire_once(config).await,
        Command::PrintConfig => {
            println!("{}", config.to_redacted_toml_string()?);
            Ok(())
        }
        Command::Import { file } => import(&config, &file),
        Command::Settle { step } => {
            let service = open_service(&config)?;
            let view = settle(&service, step).await?;
            println!("{} {}", view.session_id, view.status);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakeclaim_store::{StakeAssetStore, StakeClaim, StakeClaimStore, StakeRewardStore};
    use stakeclaim_types::{AssetId, ClaimStatus, StakeAddress, Timestamp};
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["stakeclaim-daemon"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_override_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "rpc_port = 9000\npool_id = \"pool1file\"\nstake_asset_policy_ids = [\"aa\"]"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = parse(&[
            "--config",
            &path,
            "--pool-id",
            "pool1flag",
            "--network",
            "testnet",
            "--stake-asset-policy-ids",
            "bb,cc",
            "run",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.rpc_port, 9000);
        assert_eq!(config.pool_id, "pool1flag");
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.stake_asset_policy_ids, vec!["bb", "cc"]);
    }

    #[test]
    fn unknown_network_is_rejected() {
        let cli = parse(&["--network", "moon", "run"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn service_opens_on_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            data_dir: dir.path().join("db"),
            lmdb_map_size: 16 * 1024 * 1024,
            ..ServiceConfig::default()
        };
        let service = open_service(&config).unwrap();
        assert!(service.get_session("missing").is_err());
        assert!(config.data_dir.join("data.mdb").exists());
    }

    #[test]
    fn blank_policy_flag_is_rejected() {
        let cli = parse(&["--stake-asset-policy-ids", "aa, ", "run"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = parse(&["import", "seed.toml"]);
        assert!(matches!(
            cli.command,
            Command::Import { file } if file == PathBuf::from("seed.toml")
        ));

        let cli = parse(&["settle", "complete", "s1", "txhash"]);
        assert!(matches!(
            cli.command,
            Command::Settle {
                step: SettleStep::Complete { session, action_hash }
            } if session == "s1" && action_hash == "txhash"
        ));

        assert!(Cli::try_parse_from(["stakeclaim-daemon", "settle", "begin", "s1"]).is_err());
    }

    fn config_in(dir: &tempfile::TempDir) -> ServiceConfig {
        ServiceConfig {
            data_dir: dir.path().join("db"),
            lmdb_map_size: 16 * 1024 * 1024,
            ..ServiceConfig::default()
        }
    }

    fn reserved_claim(session_id: &str, reward: &AssetId, asset: &AssetId) -> StakeClaim {
        let now = SystemClock.now();
        StakeClaim {
            session_id: session_id.into(),
            stake_address: StakeAddress::new("stake_test1uq"),
            status: ClaimStatus::Open,
            error: None,
            projects: None,
            payment_address: "addr_pay".into(),
            payment_amount: 3_000_000,
            service_fee: 0,
            expires_at: Timestamp::new(now.as_secs() + 3600),
            assets: [(reward.clone(), 40)].into_iter().collect(),
            assets_readable: Default::default(),
            delegator_rewards: Default::default(),
            asset_rewards: [(asset.clone(), 40)].into_iter().collect(),
            epoch: 420,
            month: 70,
            quarter: 24,
            year: 5,
            payment_hash: None,
            action_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Seed a reward and an asset through the import file, then open a
    /// session holding 40 of the reward.
    fn seeded(dir: &tempfile::TempDir, session_id: &str) -> (LmdbEnvironment, ServiceConfig) {
        let config = config_in(dir);
        let env = open_storage(&config).unwrap();
        let seed = SeedFile::parse(
            r#"
[[rewards]]
asset_id = "rewpolicy.544f4b"
name = "TOK"
balance = 100

[[assets]]
asset_id = "policy1.01"
project = "alpha"
name = "Alpha #1"
reward_amount_per_day = 10
reward = "rewpolicy.544f4b"
last_claim = 0
"#,
        )
        .unwrap();
        seed.apply(&env.asset_store(), &env.reward_store(), Timestamp::new(0))
            .unwrap();

        let reward = AssetId::new("rewpolicy.544f4b");
        let asset = AssetId::new("policy1.01");
        env.reward_store()
            .reserve(&[(reward.clone(), 40)].into_iter().collect())
            .unwrap();
        env.claim_store()
            .insert_claim(&reserved_claim(session_id, &reward, &asset))
            .unwrap();
        (env, config)
    }

    #[tokio::test]
    async fn settle_begin_then_complete_pays_out() {
        let dir = tempfile::tempdir().unwrap();
        let (env, config) = seeded(&dir, "s1");
        let service = wire_service(&config, &env).unwrap();

        let view = settle(
            &service,
            SettleStep::Begin {
                session: "s1".into(),
                payment_hash: "feehash".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(view.status, ClaimStatus::Processing);

        let view = settle(
            &service,
            SettleStep::Complete {
                session: "s1".into(),
                action_hash: "payouthash".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(view.status, ClaimStatus::Completed);
        assert_eq!(view.action_hash.as_deref(), Some("payouthash"));

        let reward = env
            .reward_store()
            .get_reward(&AssetId::new("rewpolicy.544f4b"))
            .unwrap()
            .unwrap();
        assert_eq!(reward.balance, 60);
        assert_eq!(reward.reserved_balance, 0);
        assert_eq!(reward.total_claims, 1);

        let asset = env
            .asset_store()
            .get_asset(&AssetId::new("policy1.01"))
            .unwrap()
            .unwrap();
        assert_eq!(asset.total_claims, 1);
        assert_eq!(asset.total_claimed_amount, 40);

        let stored = env.claim_store().get_claim("s1").unwrap().unwrap();
        assert_eq!(stored.payment_hash.as_deref(), Some("feehash"));
    }

    #[tokio::test]
    async fn settle_fail_releases_the_reservation() {
        let dir = tempfile::tempdir().unwrap();
        let (env, config) = seeded(&dir, "s2");
        let service = wire_service(&config, &env).unwrap();

        let view = settle(
            &service,
            SettleStep::Fail {
                session: "s2".into(),
                error: "wallet offline".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(view.status, ClaimStatus::Error);

        let reward = env
            .reward_store()
            .get_reward(&AssetId::new("rewpolicy.544f4b"))
            .unwrap()
            .unwrap();
        assert_eq!(reward.balance, 100);
        assert_eq!(reward.reserved_balance, 0);
        let stored = env.claim_store().get_claim("s2").unwrap().unwrap();
        assert_eq!(stored.error.as_deref(), Some("wallet offline"));
    }

    #[tokio::test]
    async fn settle_out_of_order_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let (env, config) = seeded(&dir, "s3");
        let service = wire_service(&config, &env).unwrap();

        let result = settle(
            &service,
            SettleStep::Complete {
                session: "s3".into(),
                action_hash: "payouthash".into(),
            },
        )
        .await;
        assert!(result.is_err());
        let stored = env.claim_store().get_claim("s3").unwrap().unwrap();
        assert_eq!(stored.status, ClaimStatus::Open);

        assert!(settle(
            &service,
            SettleStep::Begin {
                session: "missing".into(),
                payment_hash: "feehash".into(),
            },
        )
        .await
        .is_err());
    }
}
