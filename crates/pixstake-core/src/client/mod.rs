//! External collaborators: chain RPC, asset index, metadata host and signer.

mod das;
mod metadata;
mod rpc;
mod signer;

pub use das::DasAssetIndex;
pub use metadata::HttpMetadataFetcher;
pub use rpc::RpcChainClient;
pub use signer::{ApprovalPrompt, KeypairSigner};

use async_trait::async_trait;
use pixstake_common::{IndexedAsset, Result};
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};

/// Upper bound on addresses per `getMultipleAccounts` call.
pub const MAX_MULTIPLE_ACCOUNTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Processed,
    Confirmed,
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureState {
    pub confirmation_status: Option<ConfirmationStatus>,
    /// Execution error reported by the cluster, if any
    pub err: Option<String>,
}

impl SignatureState {
    pub fn is_finalized(&self) -> bool {
        self.confirmation_status == Some(ConfirmationStatus::Finalized)
    }
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Raw account data per address, in request order. At most
    /// [`MAX_MULTIPLE_ACCOUNTS`] addresses per call.
    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<Vec<u8>>>>;

    async fn get_slot(&self) -> Result<u64>;

    /// Block time of `slot`, `None` while the cluster cannot report it.
    async fn get_block_time(&self, slot: u64) -> Result<Option<i64>>;

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureState>>>;

    /// Finalized recent blockhash.
    async fn get_latest_blockhash(&self) -> Result<Hash>;

    /// UI amount of `mint` held by `owner`, `"0"` without a token account.
    async fn get_token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<String>;

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature>;
}

#[async_trait]
pub trait AssetIndex: Send + Sync {
    async fn find_assets_by_owner(&self, owner: &Pubkey) -> Result<Vec<IndexedAsset>>;
}

#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// `image` field of the off-chain metadata document at `uri`.
    async fn fetch_image(&self, uri: &str) -> Result<Option<String>>;
}

/// Wallet that signs on the user's behalf. Rejections surface as
/// `Error::SignerRejected` or as `Error::Signer` with the provider message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction>;

    async fn sign_all_transactions(&self, transactions: Vec<Transaction>)
        -> Result<Vec<Transaction>>;
}
