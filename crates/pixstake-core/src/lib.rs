//! Client-side core of the pixel staking program
//!
//! Derives program addresses, decodes stake records, computes rewards, builds
//! stake/unstake/claim transactions and drives them to finalization.

pub mod client;
pub mod decoder;
pub mod deriver;
pub mod instructions;
pub mod orchestrator;
pub mod portfolio;
pub mod rewards;
pub mod state;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::{
    ApprovalPrompt, AssetIndex, ChainClient, ConfirmationStatus, DasAssetIndex,
    HttpMetadataFetcher, KeypairSigner, MetadataFetcher, RpcChainClient, SignatureState,
    TransactionSigner,
};
pub use decoder::decode_stake_record;
pub use deriver::{AddressDeriver, DerivedAddress};
pub use instructions::{InstructionBuilder, TransactionEnvelope};
pub use orchestrator::{
    ActionFailure, ActionPhase, ActionReport, ActionRequest, SubmissionOrchestrator,
};
pub use portfolio::StakePortfolio;
pub use rewards::RewardCalculator;
pub use state::{
    spawn_periodic_refresh, Notification, PopupHandle, PopupState, RefreshTarget, StateStore,
    StoreEvent, WalletState,
};
