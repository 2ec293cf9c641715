use async_trait::async_trait;
use pixstake_common::{Error, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::Transaction,
};
use tracing::info;

use super::TransactionSigner;

/// Asked with the number of transactions about to be signed.
pub type ApprovalPrompt = Box<dyn Fn(usize) -> bool + Send + Sync>;

/// Signs with a local keypair, optionally asking for approval first.
pub struct KeypairSigner {
    keypair: Keypair,
    approve: Option<ApprovalPrompt>,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            approve: None,
        }
    }

    pub fn with_approval(mut self, approve: ApprovalPrompt) -> Self {
        self.approve = Some(approve);
        self
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn check_approval(&self, count: usize) -> Result<()> {
        match &self.approve {
            Some(approve) if !approve(count) => {
                info!("Signing of {} transaction(s) declined", count);
                Err(Error::SignerRejected)
            }
            _ => Ok(()),
        }
    }

    fn sign(&self, mut transaction: Transaction) -> Result<Transaction> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|e| Error::Signer(e.to_string()))?;
        Ok(transaction)
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        self.check_approval(1)?;
        self.sign(transaction)
    }

    async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>> {
        self.check_approval(transactions.len())?;
        transactions.into_iter().map(|tx| self.sign(tx)).collect()
    }
}
