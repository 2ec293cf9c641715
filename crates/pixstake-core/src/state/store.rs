use std::{sync::Arc, time::Duration};

use pixstake_common::{ActionFlow, AssetRef, StakedAsset};
use solana_sdk::pubkey::Pubkey;
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        watch,
    },
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use super::{popup::PopupState, wallet::WalletState, Notification};
use crate::{orchestrator::ActionPhase, portfolio::StakePortfolio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTarget {
    WalletAssets,
    WalletAssetCount,
    TokenBalance,
    /// Owner's staked assets, together with the pool and wallet counts
    StakedAssets,
    StakedInPool,
}

#[derive(Debug, Clone)]
pub enum StoreEvent {
    Refresh(RefreshTarget),
    PhaseChanged { flow: ActionFlow, phase: ActionPhase },
    StakeSucceeded { count: usize },
    UnstakeSucceeded { mint: Pubkey },
    OpenPopup(ActionFlow),
    ClosePopup(ActionFlow),
    SetPopupStep(u8),
    PopupError(Notification),
    ResetPopup,
    SelectAsset(Pubkey),
    WalletAssetsLoaded(Vec<AssetRef>),
    WalletAssetCountLoaded(usize),
    TokenBalanceLoaded(String),
    StakedAssetsLoaded(Vec<StakedAsset>),
    StakedInPoolLoaded(usize),
    RefreshFailed { target: RefreshTarget, message: String },
    /// Sent by a refresh task after its results.
    RefreshDone(RefreshTarget),
    /// Stops the store once in-flight refreshes have reported.
    Shutdown,
}

/// Read-only view of the popup state, used to decide whether an action's
/// outcome is shown.
#[derive(Debug, Clone)]
pub struct PopupHandle {
    rx: watch::Receiver<PopupState>,
}

impl PopupHandle {
    pub fn new(rx: watch::Receiver<PopupState>) -> Self {
        Self { rx }
    }

    pub fn snapshot(&self) -> PopupState {
        self.rx.borrow().clone()
    }

    pub fn accepts(&self, flow: ActionFlow) -> bool {
        self.rx.borrow().accepts(flow)
    }
}

/// Owns wallet and popup state. Every mutation arrives as a [`StoreEvent`]
/// and is applied by the task running [`StateStore::run`].
pub struct StateStore {
    owner: Pubkey,
    portfolio: Arc<StakePortfolio>,
    events_tx: UnboundedSender<StoreEvent>,
    events_rx: UnboundedReceiver<StoreEvent>,
    wallet: watch::Sender<WalletState>,
    popup: watch::Sender<PopupState>,
    in_flight: usize,
}

impl StateStore {
    pub fn new(owner: Pubkey, portfolio: Arc<StakePortfolio>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (wallet, _) = watch::channel(WalletState::default());
        let (popup, _) = watch::channel(PopupState::default());
        Self {
            owner,
            portfolio,
            events_tx,
            events_rx,
            wallet,
            popup,
            in_flight: 0,
        }
    }

    pub fn sender(&self) -> UnboundedSender<StoreEvent> {
        self.events_tx.clone()
    }

    pub fn popup_handle(&self) -> PopupHandle {
        PopupHandle::new(self.popup.subscribe())
    }

    pub fn wallet(&self) -> watch::Receiver<WalletState> {
        self.wallet.subscribe()
    }

    /// Applies events until [`StoreEvent::Shutdown`] arrives and every
    /// refresh started before it has reported back.
    pub async fn run(mut self) {
        info!("State store started for {}", self.owner);
        let mut stopping = false;
        while let Some(event) = self.events_rx.recv().await {
            match event {
                StoreEvent::Shutdown => stopping = true,
                StoreEvent::RefreshDone(target) => {
                    debug!("Refresh of {:?} done", target);
                    self.in_flight = self.in_flight.saturating_sub(1);
                }
                event => self.apply(event),
            }
            if stopping {
                if self.in_flight == 0 {
                    break;
                }
                debug!("Waiting on {} refresh(es) before stopping", self.in_flight);
            }
        }
        info!("State store stopped");
    }

    fn apply(&mut self, event: StoreEvent) {
        debug!("Applying {:?}", event);
        match event {
            StoreEvent::Refresh(target) => self.start_refresh(target),
            StoreEvent::PhaseChanged { flow, phase } => {
                self.popup.send_modify(|popup| popup.phase = Some((flow, phase)))
            }
            StoreEvent::StakeSucceeded { count } => {
                self.wallet.send_modify(|wallet| wallet.stake_succeeded(count))
            }
            StoreEvent::UnstakeSucceeded { mint } => {
                self.wallet.send_modify(|wallet| wallet.unstake_succeeded(&mint))
            }
            StoreEvent::OpenPopup(flow) => self.popup.send_modify(|popup| popup.open(flow)),
            StoreEvent::ClosePopup(flow) => self.popup.send_modify(|popup| popup.close(flow)),
            StoreEvent::SetPopupStep(step) => self.popup.send_modify(|popup| popup.set_step(step)),
            StoreEvent::PopupError(notification) => {
                self.popup.send_modify(|popup| popup.set_error(&notification))
            }
            StoreEvent::ResetPopup => self.popup.send_modify(|popup| popup.reset()),
            StoreEvent::SelectAsset(mint) => self.wallet.send_modify(|wallet| {
                if !wallet.select(&mint) {
                    warn!("Asset {} is not among the staked assets", mint);
                }
            }),
            StoreEvent::WalletAssetsLoaded(assets) => self.wallet.send_modify(|wallet| {
                wallet.wallet_assets = assets;
                wallet.loading_wallet_assets = false;
            }),
            StoreEvent::WalletAssetCountLoaded(count) => {
                self.wallet.send_modify(|wallet| wallet.wallet_asset_count = count)
            }
            StoreEvent::TokenBalanceLoaded(balance) => {
                self.wallet.send_modify(|wallet| wallet.token_balance = balance)
            }
            StoreEvent::StakedAssetsLoaded(assets) => self.wallet.send_modify(|wallet| {
                wallet.staked_assets = assets;
                wallet.loading_staked_assets = false;
            }),
            StoreEvent::StakedInPoolLoaded(count) => {
                self.wallet.send_modify(|wallet| wallet.staked_in_pool = count)
            }
            StoreEvent::RefreshFailed { target, message } => {
                warn!("Refresh of {:?} failed: {}", target, message);
                self.wallet.send_modify(|wallet| wallet.fail(message));
            }
            StoreEvent::RefreshDone(_) | StoreEvent::Shutdown => {}
        }
    }

    fn start_refresh(&mut self, target: RefreshTarget) {
        self.in_flight += 1;
        self.wallet.send_modify(|wallet| {
            wallet.error = None;
            match target {
                RefreshTarget::WalletAssets => wallet.loading_wallet_assets = true,
                RefreshTarget::StakedAssets => wallet.loading_staked_assets = true,
                _ => {}
            }
        });

        let portfolio = self.portfolio.clone();
        let events = self.events_tx.clone();
        let owner = self.owner;
        tokio::spawn(async move {
            let outcome = refresh(&portfolio, &owner, target, &events).await;
            let event = match outcome {
                Ok(event) => event,
                Err(e) => StoreEvent::RefreshFailed {
                    target,
                    message: e.to_string(),
                },
            };
            // The store may already be gone during shutdown.
            let _ = events.send(event);
            let _ = events.send(StoreEvent::RefreshDone(target));
        });
    }
}

async fn refresh(
    portfolio: &StakePortfolio,
    owner: &Pubkey,
    target: RefreshTarget,
    events: &UnboundedSender<StoreEvent>,
) -> pixstake_common::Result<StoreEvent> {
    Ok(match target {
        RefreshTarget::WalletAssets => {
            StoreEvent::WalletAssetsLoaded(portfolio.wallet_assets(owner).await?)
        }
        RefreshTarget::WalletAssetCount => {
            StoreEvent::WalletAssetCountLoaded(portfolio.wallet_asset_count(owner).await?)
        }
        RefreshTarget::TokenBalance => {
            StoreEvent::TokenBalanceLoaded(portfolio.reward_token_balance(owner).await?)
        }
        RefreshTarget::StakedInPool => {
            StoreEvent::StakedInPoolLoaded(portfolio.staked_in_pool_count().await?)
        }
        RefreshTarget::StakedAssets => {
            let staked = portfolio.staked_assets_for_owner(owner).await?;
            let in_pool = portfolio.staked_in_pool_count().await?;
            let _ = events.send(StoreEvent::StakedInPoolLoaded(in_pool));
            let _ = events.send(StoreEvent::Refresh(RefreshTarget::WalletAssetCount));
            StoreEvent::StakedAssetsLoaded(staked)
        }
    })
}

/// Re-reads the pool count every `interval` until the store goes away.
pub fn spawn_periodic_refresh(
    events: UnboundedSender<StoreEvent>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if events
                .send(StoreEvent::Refresh(RefreshTarget::StakedInPool))
                .is_err()
            {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        state::popup::{STEP_ERROR, STEP_PENDING},
        test_utils::{collection_asset, test_addresses, FakeAssetIndex, FakeChain, FakeMetadata},
    };
    use pixstake_common::{FailureKind, ProgramAddresses, TimingConfig};
    use tokio::time::timeout;

    fn store(addresses: ProgramAddresses, index: FakeAssetIndex, owner: Pubkey) -> StateStore {
        let portfolio = StakePortfolio::new(
            Arc::new(FakeChain {
                balance: "12.5".to_string(),
                ..Default::default()
            }),
            Arc::new(index),
            Arc::new(FakeMetadata::default()),
            addresses,
            TimingConfig::immediate(),
        );
        StateStore::new(owner, Arc::new(portfolio))
    }

    async fn wait_until<F>(rx: &mut watch::Receiver<WalletState>, done: F) -> WalletState
    where
        F: Fn(&WalletState) -> bool,
    {
        loop {
            {
                let state = rx.borrow_and_update();
                if done(&state) {
                    return state.clone();
                }
            }
            timeout(Duration::from_secs(5), rx.changed())
                .await
                .expect("state did not settle")
                .expect("store stopped");
        }
    }

    #[tokio::test]
    async fn test_refreshes_update_wallet_state() {
        let addresses = test_addresses();
        let owner = Pubkey::new_unique();
        let mut index = FakeAssetIndex::default();
        index.hold(owner, collection_asset(addresses.collection_creator, "a"));
        index.hold(owner, collection_asset(addresses.collection_creator, "b"));
        index.hold(addresses.vault, collection_asset(addresses.collection_creator, "c"));

        let store = store(addresses, index, owner);
        let events = store.sender();
        let mut wallet = store.wallet();
        let handle = tokio::spawn(store.run());

        events.send(StoreEvent::Refresh(RefreshTarget::WalletAssets)).unwrap();
        events.send(StoreEvent::Refresh(RefreshTarget::TokenBalance)).unwrap();
        events.send(StoreEvent::Refresh(RefreshTarget::StakedAssets)).unwrap();

        let state = wait_until(&mut wallet, |w| {
            w.wallet_assets.len() == 2
                && w.token_balance == "12.5"
                && w.staked_in_pool == 1
                && w.wallet_asset_count == 2
                && !w.loading_staked_assets
        })
        .await;
        assert!(state.staked_assets.is_empty());
        assert!(state.error.is_none());

        events.send(StoreEvent::Shutdown).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_popup_events() {
        let store = store(test_addresses(), FakeAssetIndex::default(), Pubkey::new_unique());
        let events = store.sender();
        let popup = store.popup_handle();
        let handle = tokio::spawn(store.run());

        events.send(StoreEvent::OpenPopup(ActionFlow::Claim)).unwrap();
        events.send(StoreEvent::SetPopupStep(STEP_PENDING)).unwrap();
        events
            .send(StoreEvent::PopupError(Notification::for_failure(
                ActionFlow::Claim,
                FailureKind::InsufficientFunds,
            )))
            .unwrap();
        events.send(StoreEvent::Shutdown).unwrap();
        handle.await.unwrap();

        let state = popup.snapshot();
        assert!(state.claim_open);
        assert_eq!(state.popup_type, Some(ActionFlow::Claim));
        assert_eq!(state.step, STEP_ERROR);
        assert_eq!(state.error, "Insufficient balance");
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_running_refreshes() {
        let addresses = test_addresses();
        let owner = Pubkey::new_unique();
        let mut index = FakeAssetIndex::default();
        index.hold(owner, collection_asset(addresses.collection_creator, "a"));
        index.hold(addresses.vault, collection_asset(addresses.collection_creator, "b"));

        let store = store(addresses, index, owner);
        let events = store.sender();
        let wallet = store.wallet();
        let handle = tokio::spawn(store.run());

        events.send(StoreEvent::Refresh(RefreshTarget::WalletAssets)).unwrap();
        events.send(StoreEvent::Refresh(RefreshTarget::TokenBalance)).unwrap();
        events.send(StoreEvent::Refresh(RefreshTarget::StakedAssets)).unwrap();
        events.send(StoreEvent::Shutdown).unwrap();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();

        let state = wallet.borrow().clone();
        assert_eq!(state.wallet_assets.len(), 1);
        assert_eq!(state.token_balance, "12.5");
        assert_eq!(state.staked_in_pool, 1);
        // Started by the staked assets refresh, itself awaited.
        assert_eq!(state.wallet_asset_count, 1);
        assert!(!state.loading_staked_assets);
    }

    #[tokio::test]
    async fn test_periodic_refresh_emits_pool_refresh() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = spawn_periodic_refresh(tx, Duration::from_millis(10));

        let event = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert!(matches!(
            event,
            StoreEvent::Refresh(RefreshTarget::StakedInPool)
        ));

        drop(rx);
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }
}
