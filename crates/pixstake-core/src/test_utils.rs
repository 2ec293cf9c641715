//! In-memory collaborators shared by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use pixstake_common::{
    AssetCreator, Error, IndexedAsset, ProgramAddresses, Result, StakeRecord,
};
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};

use crate::{
    client::{
        AssetIndex, ChainClient, ConfirmationStatus, MetadataFetcher, SignatureState,
        MAX_MULTIPLE_ACCOUNTS,
    },
    decoder::encode_stake_record,
};

pub fn test_addresses() -> ProgramAddresses {
    ProgramAddresses {
        program_id: Pubkey::new_unique(),
        vault: Pubkey::new_unique(),
        collection_creator: Pubkey::new_unique(),
        reward_mint: Pubkey::new_unique(),
        token_program: spl_token_program(),
        associated_token_program: Pubkey::new_unique(),
        metadata_program: Pubkey::new_unique(),
    }
}

fn spl_token_program() -> Pubkey {
    "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
        .parse()
        .unwrap()
}

/// One scripted answer to a status poll.
pub enum PollStep {
    Status(ConfirmationStatus),
    Failed(String),
    Error(String),
}

pub struct FakeChain {
    pub blockhash: Hash,
    pub now: i64,
    pub accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    pub account_calls: Mutex<Vec<Vec<Pubkey>>>,
    pub missing_block_times: Mutex<u32>,
    pub poll_script: Mutex<VecDeque<PollStep>>,
    pub status_polls: Mutex<u32>,
    pub sent: Mutex<Vec<Transaction>>,
    pub send_error: Mutex<Option<String>>,
    /// Sends past this many fail with a network error.
    pub accepted_sends: Mutex<Option<usize>>,
    pub balance: String,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self {
            blockhash: Hash::new_unique(),
            now: 1_700_000_000,
            accounts: Mutex::new(HashMap::new()),
            account_calls: Mutex::new(Vec::new()),
            missing_block_times: Mutex::new(0),
            poll_script: Mutex::new(VecDeque::new()),
            status_polls: Mutex::new(0),
            sent: Mutex::new(Vec::new()),
            send_error: Mutex::new(None),
            accepted_sends: Mutex::new(None),
            balance: "0".to_string(),
        }
    }
}

impl FakeChain {
    pub fn insert_account(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(address, data);
    }

    pub fn insert_record(&self, address: Pubkey, record: &StakeRecord) {
        self.insert_account(address, encode_stake_record(record));
    }

    pub fn script_polls(&self, steps: Vec<PollStep>) {
        self.poll_script.lock().unwrap().extend(steps);
    }

    pub fn call_sizes(&self) -> Vec<usize> {
        self.account_calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.len())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn polls(&self) -> u32 {
        *self.status_polls.lock().unwrap()
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<Vec<u8>>>> {
        assert!(addresses.len() <= MAX_MULTIPLE_ACCOUNTS);
        self.account_calls.lock().unwrap().push(addresses.to_vec());
        let accounts = self.accounts.lock().unwrap();
        Ok(addresses.iter().map(|a| accounts.get(a).cloned()).collect())
    }

    async fn get_slot(&self) -> Result<u64> {
        Ok(42)
    }

    async fn get_block_time(&self, _slot: u64) -> Result<Option<i64>> {
        let mut missing = self.missing_block_times.lock().unwrap();
        if *missing > 0 {
            *missing -= 1;
            return Ok(None);
        }
        Ok(Some(self.now))
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureState>>> {
        *self.status_polls.lock().unwrap() += 1;
        let step = self.poll_script.lock().unwrap().pop_front();
        let state = match step {
            None => SignatureState {
                confirmation_status: Some(ConfirmationStatus::Finalized),
                err: None,
            },
            Some(PollStep::Status(status)) => SignatureState {
                confirmation_status: Some(status),
                err: None,
            },
            Some(PollStep::Failed(err)) => SignatureState {
                confirmation_status: Some(ConfirmationStatus::Finalized),
                err: Some(err),
            },
            Some(PollStep::Error(message)) => return Err(Error::Network(message)),
        };
        Ok(signatures.iter().map(|_| Some(state.clone())).collect())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        Ok(self.blockhash)
    }

    async fn get_token_balance(&self, _owner: &Pubkey, _mint: &Pubkey) -> Result<String> {
        Ok(self.balance.clone())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        if let Some(message) = self.send_error.lock().unwrap().clone() {
            return Err(Error::Rpc {
                code: -32002,
                message,
            });
        }
        let mut sent = self.sent.lock().unwrap();
        if let Some(limit) = *self.accepted_sends.lock().unwrap() {
            if sent.len() >= limit {
                return Err(Error::Network("connection closed".to_string()));
            }
        }
        sent.push(transaction.clone());
        Ok(transaction
            .signatures
            .first()
            .copied()
            .filter(|sig| *sig != Signature::default())
            .unwrap_or_else(Signature::new_unique))
    }
}

#[derive(Default)]
pub struct FakeAssetIndex {
    pub holdings: HashMap<Pubkey, Vec<IndexedAsset>>,
}

impl FakeAssetIndex {
    pub fn hold(&mut self, owner: Pubkey, asset: IndexedAsset) {
        self.holdings.entry(owner).or_default().push(asset);
    }
}

#[async_trait]
impl AssetIndex for FakeAssetIndex {
    async fn find_assets_by_owner(&self, owner: &Pubkey) -> Result<Vec<IndexedAsset>> {
        Ok(self.holdings.get(owner).cloned().unwrap_or_default())
    }
}

/// Serves `<uri>.png` for every uri, fails for uris containing `broken`.
#[derive(Default)]
pub struct FakeMetadata {
    pub calls: Mutex<u32>,
}

#[async_trait]
impl MetadataFetcher for FakeMetadata {
    async fn fetch_image(&self, uri: &str) -> Result<Option<String>> {
        *self.calls.lock().unwrap() += 1;
        if uri.contains("broken") {
            return Err(Error::Network(format!("GET {} failed", uri)));
        }
        Ok(Some(format!("{}.png", uri)))
    }
}

pub fn collection_asset(collection_creator: Pubkey, name: &str) -> IndexedAsset {
    IndexedAsset {
        mint: Pubkey::new_unique(),
        name: name.to_string(),
        symbol: "PP".to_string(),
        uri: format!("https://arweave.net/{}", name),
        creators: vec![AssetCreator {
            address: collection_creator,
            verified: true,
        }],
    }
}
