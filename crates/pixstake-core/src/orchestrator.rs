//! Drives one user action from unsigned transactions to finalization
//!
//! Every action walks `Building -> AwaitingSignature -> Broadcasting ->
//! Confirming` and ends in `Finalized` or `Failed`. Outcomes reach the rest of
//! the application only as [`StoreEvent`]s.

use std::sync::Arc;

use pixstake_common::{
    ActionFlow, AssetRef, Error, FailureKind, ProgramAddresses, Result, StakedAsset,
    TimingConfig,
};
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use tokio::{sync::mpsc::UnboundedSender, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    client::{ChainClient, TransactionSigner},
    instructions::InstructionBuilder,
    state::{Notification, PopupHandle, RefreshTarget, StoreEvent, STEP_SUCCESS},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    Building,
    AwaitingSignature,
    Broadcasting,
    Confirming,
    Finalized,
    Failed,
}

#[derive(Debug, Clone)]
pub enum ActionRequest {
    Stake { assets: Vec<AssetRef> },
    Unstake { asset: StakedAsset },
    Claim { asset: StakedAsset },
}

impl ActionRequest {
    pub fn flow(&self) -> ActionFlow {
        match self {
            ActionRequest::Stake { .. } => ActionFlow::Stake,
            ActionRequest::Unstake { .. } => ActionFlow::Unstake,
            ActionRequest::Claim { .. } => ActionFlow::Claim,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionFailure {
    pub kind: FailureKind,
    /// The underlying error, for logs
    pub message: String,
    /// What the user was shown, if the popup guard let it through
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone)]
pub struct ActionReport {
    pub flow: ActionFlow,
    pub phase: ActionPhase,
    /// Receipts of every broadcast transaction
    pub signatures: Vec<Signature>,
    pub failure: Option<ActionFailure>,
}

impl ActionReport {
    pub fn is_success(&self) -> bool {
        self.phase == ActionPhase::Finalized
    }
}

pub struct SubmissionOrchestrator {
    chain: Arc<dyn ChainClient>,
    builder: InstructionBuilder,
    popup: PopupHandle,
    events: UnboundedSender<StoreEvent>,
    timing: TimingConfig,
}

impl SubmissionOrchestrator {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        addresses: ProgramAddresses,
        popup: PopupHandle,
        events: UnboundedSender<StoreEvent>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            builder: InstructionBuilder::new(chain.clone(), addresses),
            chain,
            popup,
            events,
            timing,
        }
    }

    pub fn builder(&self) -> &InstructionBuilder {
        &self.builder
    }

    /// Runs `request` for `owner`. Failures are classified and reported, never
    /// returned as errors.
    pub async fn execute(
        &self,
        owner: &Pubkey,
        request: ActionRequest,
        signer: &dyn TransactionSigner,
    ) -> ActionReport {
        let flow = request.flow();
        let mut signatures = Vec::new();

        match self.submit(owner, &request, signer, &mut signatures).await {
            Ok(()) => {
                self.transition(flow, ActionPhase::Finalized);
                self.publish_success(&request, signatures.len()).await;
                ActionReport {
                    flow,
                    phase: ActionPhase::Finalized,
                    signatures,
                    failure: None,
                }
            }
            Err(e) => {
                warn!("{} action failed: {}", flow, e);
                self.transition(flow, ActionPhase::Failed);
                let failure = self.publish_failure(flow, &e);
                if !signatures.is_empty() {
                    // Some transactions reached the cluster and may still land.
                    warn!(
                        "{} of the {} transaction(s) were already broadcast",
                        signatures.len(),
                        flow
                    );
                    self.emit(StoreEvent::Refresh(RefreshTarget::WalletAssets));
                    self.emit(StoreEvent::Refresh(RefreshTarget::StakedAssets));
                    self.emit(StoreEvent::Refresh(RefreshTarget::TokenBalance));
                }
                ActionReport {
                    flow,
                    phase: ActionPhase::Failed,
                    signatures,
                    failure: Some(failure),
                }
            }
        }
    }

    async fn submit(
        &self,
        owner: &Pubkey,
        request: &ActionRequest,
        signer: &dyn TransactionSigner,
        signatures: &mut Vec<Signature>,
    ) -> Result<()> {
        let flow = request.flow();

        self.transition(flow, ActionPhase::Building);
        let envelopes = match request {
            ActionRequest::Stake { assets } => {
                if assets.is_empty() {
                    return Err(Error::Other("no assets selected for staking".to_string()));
                }
                self.builder.build_stake_transactions(owner, assets).await?
            }
            ActionRequest::Unstake { asset } => {
                vec![self.builder.build_unstake_transaction(owner, &asset.asset).await?]
            }
            ActionRequest::Claim { asset } => {
                vec![self.builder.build_claim_transaction(owner, &asset.asset).await?]
            }
        };
        let unsigned: Vec<Transaction> = envelopes
            .into_iter()
            .map(|envelope| envelope.transaction)
            .collect();

        self.transition(flow, ActionPhase::AwaitingSignature);
        let signed = match request {
            ActionRequest::Stake { .. } => signer.sign_all_transactions(unsigned).await?,
            ActionRequest::Unstake { .. } | ActionRequest::Claim { .. } => {
                let mut signed = Vec::with_capacity(unsigned.len());
                for transaction in unsigned {
                    signed.push(signer.sign_transaction(transaction).await?);
                }
                signed
            }
        };

        self.transition(flow, ActionPhase::Broadcasting);
        for transaction in &signed {
            let signature = self.chain.send_transaction(transaction).await?;
            debug!("Sent {} transaction {}", flow, signature);
            signatures.push(signature);
        }

        self.transition(flow, ActionPhase::Confirming);
        self.await_finalization(signatures).await
    }

    /// Polls until every receipt is finalized, at most
    /// `max_confirmation_polls` times.
    async fn await_finalization(&self, signatures: &[Signature]) -> Result<()> {
        let attempts = self.timing.max_confirmation_polls;
        for attempt in 1..=attempts {
            sleep(self.timing.poll_interval()).await;

            let statuses = match self.chain.get_signature_statuses(signatures).await {
                Ok(statuses) => statuses,
                Err(e) => {
                    warn!("Status poll {} failed: {}", attempt, e);
                    continue;
                }
            };

            if let Some(err) = statuses
                .iter()
                .flatten()
                .filter(|state| state.is_finalized())
                .find_map(|state| state.err.clone())
            {
                return Err(Error::Other(format!("transaction failed: {}", err)));
            }

            let finalized = statuses
                .iter()
                .filter(|status| matches!(status, Some(state) if state.is_finalized()))
                .count();
            if statuses.len() == signatures.len() && finalized == signatures.len() {
                info!("{} transaction(s) finalized after {} polls", finalized, attempt);
                return Ok(());
            }
            debug!(
                "{}/{} transactions finalized (poll {})",
                finalized,
                signatures.len(),
                attempt
            );
        }
        Err(Error::ConfirmationTimeout { attempts })
    }

    async fn publish_success(&self, request: &ActionRequest, count: usize) {
        let flow = request.flow();
        match request {
            ActionRequest::Stake { .. } => {
                self.emit(StoreEvent::StakeSucceeded { count });
                sleep(self.timing.refresh_delay()).await;
                self.emit(StoreEvent::Refresh(RefreshTarget::WalletAssets));
                self.emit(StoreEvent::Refresh(RefreshTarget::StakedAssets));
            }
            ActionRequest::Claim { .. } => {
                self.emit(StoreEvent::Refresh(RefreshTarget::WalletAssetCount));
                self.emit(StoreEvent::Refresh(RefreshTarget::TokenBalance));
                self.emit(StoreEvent::Refresh(RefreshTarget::StakedAssets));
            }
            ActionRequest::Unstake { asset } => {
                self.emit(StoreEvent::UnstakeSucceeded {
                    mint: asset.asset.mint,
                });
                self.emit(StoreEvent::Refresh(RefreshTarget::WalletAssetCount));
                self.emit(StoreEvent::Refresh(RefreshTarget::WalletAssets));
                self.emit(StoreEvent::Refresh(RefreshTarget::TokenBalance));
            }
        }

        if self.popup.accepts(flow) {
            self.emit(StoreEvent::OpenPopup(flow));
            self.emit(StoreEvent::SetPopupStep(STEP_SUCCESS));
        }
    }

    fn publish_failure(&self, flow: ActionFlow, error: &Error) -> ActionFailure {
        let kind = error.kind();
        let notification = if self.popup.accepts(flow) {
            let notification = Notification::for_failure(flow, kind);
            self.emit(StoreEvent::PopupError(notification.clone()));
            Some(notification)
        } else {
            debug!("Another popup is active, not surfacing {} failure", flow);
            None
        };

        ActionFailure {
            kind,
            message: error.to_string(),
            notification,
        }
    }

    fn transition(&self, flow: ActionFlow, phase: ActionPhase) {
        info!("{} action: {:?}", flow, phase);
        self.emit(StoreEvent::PhaseChanged { flow, phase });
    }

    fn emit(&self, event: StoreEvent) {
        if self.events.send(event).is_err() {
            debug!("State store is gone, dropping event");
        }
    }
}
