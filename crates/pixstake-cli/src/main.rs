use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use pixstake_common::{
    utils::{current_timestamp, format_timestamp, shortcut_wallet, string_to_pubkey},
    RuntimeMode, StakingConfig,
};
use pixstake_core::{
    spawn_periodic_refresh, state::STEP_PENDING, ActionReport, ActionRequest, DasAssetIndex,
    HttpMetadataFetcher, KeypairSigner, RefreshTarget, RewardCalculator, RpcChainClient,
    StakePortfolio, StateStore, StoreEvent, SubmissionOrchestrator,
};
use serde_json::json;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
    signer::Signer,
};
use tracing::{error, info};

mod output;

#[derive(Parser, Debug)]
#[command(author, version, about = "Stake pixel NFTs and claim rewards", long_about = None)]
struct Args {
    /// JSON config file; the environment is used when omitted
    #[arg(long, env = "PIXSTAKE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured runtime mode (development or production)
    #[arg(long)]
    mode: Option<RuntimeMode>,

    /// Keypair file in the Solana CLI JSON format
    #[arg(long, env = "PIXSTAKE_KEYPAIR")]
    keypair: Option<PathBuf>,

    /// Base58 secret key, as exported by browser wallets
    #[arg(long, env = "PIXSTAKE_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List assets staked by the owner, with their rewards
    Staked {
        #[arg(long)]
        owner: Option<String>,
    },
    /// List collection assets held by the owner
    Wallet {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Reward token balance and pool size
    Balance {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Stake one or more assets from the wallet
    Stake {
        #[arg(long = "mint", required = true)]
        mints: Vec<String>,
        /// Sign without asking
        #[arg(long)]
        yes: bool,
    },
    /// Return a staked asset to the wallet together with its reward
    Unstake {
        #[arg(long)]
        mint: String,
        #[arg(long)]
        yes: bool,
    },
    /// Claim the accrued reward of a staked asset
    Claim {
        #[arg(long)]
        mint: String,
        #[arg(long)]
        yes: bool,
    },
    /// Accrued reward after each day of staking
    RewardTable {
        #[arg(long, default_value_t = 180)]
        days: u64,
    },
    /// Keep the wallet state fresh and report pool changes
    Watch,
}

struct Services {
    config: StakingConfig,
    chain: Arc<RpcChainClient>,
    portfolio: Arc<StakePortfolio>,
}

impl Services {
    fn new(config: StakingConfig) -> Result<Self> {
        let addresses = config.addresses().context("Invalid program addresses")?;
        let cluster = config.active();
        info!("Using {} cluster at {}", config.mode, cluster.rpc_url);

        let chain = Arc::new(RpcChainClient::new(cluster.rpc_url.clone()));
        let portfolio = Arc::new(StakePortfolio::new(
            chain.clone(),
            Arc::new(DasAssetIndex::new(cluster.das_endpoint())),
            Arc::new(HttpMetadataFetcher::new()),
            addresses,
            config.timing.clone(),
        ));
        Ok(Self {
            config,
            chain,
            portfolio,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => StakingConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => StakingConfig::from_env().context("Failed to load config from environment")?,
    };
    if let Some(mode) = args.mode {
        config.mode = mode;
    }

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: Failed to set global tracing subscriber: {}", e);
    }

    if let Command::RewardTable { days } = args.command {
        output::reward_table(&RewardCalculator::default(), days, args.json);
        return Ok(());
    }

    let services = Services::new(config)?;
    match &args.command {
        Command::Staked { owner } => {
            let owner = resolve_owner(&args, owner.as_deref())?;
            let staked = services.portfolio.staked_assets_for_owner(&owner).await?;
            output::staked(&staked, services.portfolio.calculator(), args.json);
        }
        Command::Wallet { owner } => {
            let owner = resolve_owner(&args, owner.as_deref())?;
            let assets = services.portfolio.wallet_assets(&owner).await?;
            output::wallet(&assets, args.json);
        }
        Command::Balance { owner } => {
            let owner = resolve_owner(&args, owner.as_deref())?;
            let (balance, in_pool, held) = tokio::try_join!(
                services.portfolio.reward_token_balance(&owner),
                services.portfolio.staked_in_pool_count(),
                services.portfolio.wallet_asset_count(&owner),
            )?;
            if args.json {
                println!(
                    "{}",
                    json!({
                        "owner": owner.to_string(),
                        "rewardBalance": balance,
                        "walletAssets": held,
                        "stakedInPool": in_pool,
                    })
                );
            } else {
                println!("Owner:          {}", shortcut_wallet(&owner.to_string()));
                println!("Reward balance: {}", balance);
                println!("Wallet assets:  {}", held);
                println!("Staked in pool: {}", in_pool);
            }
        }
        Command::Stake { mints, yes } => {
            let signer = load_signer(&args, *yes)?;
            let owner = signer.pubkey();
            let wanted = mints
                .iter()
                .map(|mint| string_to_pubkey(mint))
                .collect::<pixstake_common::Result<Vec<_>>>()?;
            let held = services.portfolio.wallet_assets(&owner).await?;
            let assets = wanted
                .iter()
                .map(|mint| {
                    held.iter()
                        .find(|asset| asset.mint == *mint)
                        .cloned()
                        .ok_or_else(|| anyhow!("{} is not a collection asset in this wallet", mint))
                })
                .collect::<Result<Vec<_>>>()?;
            let report = run_action(&services, &signer, ActionRequest::Stake { assets }).await?;
            output::report(&report, args.json);
        }
        Command::Unstake { mint, yes } | Command::Claim { mint, yes } => {
            let signer = load_signer(&args, *yes)?;
            let owner = signer.pubkey();
            let mint = string_to_pubkey(mint)?;
            let asset = services
                .portfolio
                .staked_assets_for_owner(&owner)
                .await?
                .into_iter()
                .find(|staked| staked.asset.mint == mint)
                .ok_or_else(|| anyhow!("{} is not staked by {}", mint, owner))?;
            let request = match args.command {
                Command::Unstake { .. } => ActionRequest::Unstake { asset },
                _ => ActionRequest::Claim { asset },
            };
            let report = run_action(&services, &signer, request).await?;
            output::report(&report, args.json);
        }
        Command::Watch => watch(&args, &services).await?,
        Command::RewardTable { .. } => {}
    }

    Ok(())
}

/// Runs one action with the store attached, the way the popup flow does:
/// the flow's popup is open and waiting when the action starts.
async fn run_action(
    services: &Services,
    signer: &KeypairSigner,
    request: ActionRequest,
) -> Result<ActionReport> {
    let owner = signer.pubkey();
    let flow = request.flow();
    let store = StateStore::new(owner, services.portfolio.clone());
    let events = store.sender();
    let orchestrator = SubmissionOrchestrator::new(
        services.chain.clone(),
        services.config.addresses()?,
        store.popup_handle(),
        events.clone(),
        services.config.timing.clone(),
    );
    let store_task = tokio::spawn(store.run());

    events.send(StoreEvent::OpenPopup(flow))?;
    events.send(StoreEvent::SetPopupStep(STEP_PENDING))?;

    let report = orchestrator.execute(&owner, request, signer).await;
    if let Some(failure) = &report.failure {
        error!("{} failed: {}", flow, failure.message);
    }

    events.send(StoreEvent::ClosePopup(flow))?;
    events.send(StoreEvent::Shutdown)?;
    store_task.await.context("State store task panicked")?;
    Ok(report)
}

async fn watch(args: &Args, services: &Services) -> Result<()> {
    let owner = resolve_owner(args, None)?;
    let store = StateStore::new(owner, services.portfolio.clone());
    let events = store.sender();
    let mut wallet = store.wallet();
    let store_task = tokio::spawn(store.run());
    let refresh_task =
        spawn_periodic_refresh(events.clone(), services.config.timing.refresh_interval());

    for target in [
        RefreshTarget::TokenBalance,
        RefreshTarget::StakedAssets,
    ] {
        events.send(StoreEvent::Refresh(target))?;
    }

    info!(
        "Watching {} every {:?}",
        shortcut_wallet(&owner.to_string()),
        services.config.timing.refresh_interval()
    );
    loop {
        tokio::select! {
            changed = wallet.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = wallet.borrow_and_update().clone();
                if let Some(e) = &state.error {
                    error!("Refresh failed: {}", e);
                }
                println!(
                    "[{}] staked: {} in pool: {} wallet: {} balance: {}",
                    format_timestamp(current_timestamp()),
                    state.staked_assets.len(),
                    state.staked_in_pool,
                    state.wallet_asset_count,
                    state.token_balance,
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    refresh_task.abort();
    let _ = events.send(StoreEvent::Shutdown);
    store_task.await.context("State store task panicked")?;
    Ok(())
}

fn resolve_owner(args: &Args, owner: Option<&str>) -> Result<Pubkey> {
    match owner {
        Some(owner) => Ok(string_to_pubkey(owner)?),
        None => Ok(load_keypair(args)?.pubkey()),
    }
}

fn load_keypair(args: &Args) -> Result<Keypair> {
    if let Some(secret) = &args.secret_key {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .context("Secret key is not valid base58")?;
        return Keypair::from_bytes(&bytes).map_err(|e| anyhow!("Invalid secret key: {}", e));
    }
    let path = args
        .keypair
        .as_ref()
        .ok_or_else(|| anyhow!("No wallet given: pass --keypair, --secret-key or --owner"))?;
    read_keypair_file(path)
        .map_err(|e| anyhow!("Failed to read keypair {}: {}", path.display(), e))
}

fn load_signer(args: &Args, yes: bool) -> Result<KeypairSigner> {
    let signer = KeypairSigner::new(load_keypair(args)?);
    if yes {
        return Ok(signer);
    }
    Ok(signer.with_approval(Box::new(confirm)))
}

fn confirm(count: usize) -> bool {
    print!("Sign {} transaction(s)? [y/N] ", count);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}
