use std::str::FromStr;

use async_trait::async_trait;
use pixstake_common::{Error, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use tracing::{debug, info, warn};

use super::{ChainClient, ConfirmationStatus, SignatureState, MAX_MULTIPLE_ACCOUNTS};

/// Solana RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorDetail>,
}

/// Solana RPC error detail
#[derive(Debug, Deserialize)]
struct RpcErrorDetail {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

/// Account as returned with `base64` encoding
#[derive(Debug, Deserialize)]
struct UiAccount {
    data: (String, String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiSignatureStatus {
    confirmation_status: Option<String>,
    err: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct UiBlockhash {
    blockhash: String,
}

/// Solana JSON-RPC client
#[derive(Debug, Clone)]
pub struct RpcChainClient {
    /// HTTP client
    client: Client,
    /// RPC URL
    rpc_url: String,
}

impl RpcChainClient {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        let rpc_url = rpc_url.into();
        info!("Initializing Solana client for {}", rpc_url);
        Self {
            client: Client::new(),
            rpc_url,
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn send_request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .json::<RpcResponse>()
            .await?;

        debug!("{} response: {:?}", method, response);
        into_result(response)
    }
}

fn into_result<T: DeserializeOwned>(response: RpcResponse) -> Result<T> {
    if let Some(error) = response.error {
        return Err(Error::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    Ok(serde_json::from_value(response.result)?)
}

fn decode_accounts(accounts: Vec<Option<UiAccount>>) -> Vec<Option<Vec<u8>>> {
    accounts
        .into_iter()
        .map(|account| {
            let account = account?;
            match base64::decode(&account.data.0) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Dropping account with undecodable data: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn parse_confirmation_status(raw: &str) -> Option<ConfirmationStatus> {
    match raw {
        "processed" => Some(ConfirmationStatus::Processed),
        "confirmed" => Some(ConfirmationStatus::Confirmed),
        "finalized" => Some(ConfirmationStatus::Finalized),
        _ => None,
    }
}

fn into_signature_states(statuses: Vec<Option<UiSignatureStatus>>) -> Vec<Option<SignatureState>> {
    statuses
        .into_iter()
        .map(|status| {
            status.map(|status| SignatureState {
                confirmation_status: status
                    .confirmation_status
                    .as_deref()
                    .and_then(parse_confirmation_status),
                err: status.err.map(|err| err.to_string()),
            })
        })
        .collect()
}

/// Pulls `uiAmountString` out of a jsonParsed `getTokenAccountsByOwner` value.
fn first_token_amount(accounts: &Value) -> String {
    accounts
        .get(0)
        .and_then(|account| account.pointer("/account/data/parsed/info/tokenAmount"))
        .and_then(|amount| {
            amount
                .get("uiAmountString")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .or_else(|| amount.get("uiAmount").and_then(|v| v.as_f64()).map(|v| v.to_string()))
        })
        .unwrap_or_else(|| "0".to_string())
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<Vec<u8>>>> {
        if addresses.len() > MAX_MULTIPLE_ACCOUNTS {
            return Err(Error::Other(format!(
                "getMultipleAccounts accepts at most {} addresses, got {}",
                MAX_MULTIPLE_ACCOUNTS,
                addresses.len()
            )));
        }
        let keys: Vec<String> = addresses.iter().map(|key| key.to_string()).collect();
        let response: WithContext<Vec<Option<UiAccount>>> = self
            .send_request(
                "getMultipleAccounts",
                json!([keys, { "encoding": "base64", "commitment": "confirmed" }]),
            )
            .await?;
        Ok(decode_accounts(response.value))
    }

    async fn get_slot(&self) -> Result<u64> {
        self.send_request("getSlot", json!([])).await
    }

    async fn get_block_time(&self, slot: u64) -> Result<Option<i64>> {
        match self.send_request::<Option<i64>>("getBlockTime", json!([slot])).await {
            Ok(time) => Ok(time),
            Err(Error::Rpc { code, message }) => {
                debug!("Block time for slot {} unavailable ({}): {}", slot, code, message);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureState>>> {
        let signatures: Vec<String> = signatures.iter().map(|sig| sig.to_string()).collect();
        let response: WithContext<Vec<Option<UiSignatureStatus>>> = self
            .send_request(
                "getSignatureStatuses",
                json!([signatures, { "searchTransactionHistory": true }]),
            )
            .await?;
        Ok(into_signature_states(response.value))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        let response: WithContext<UiBlockhash> = self
            .send_request("getLatestBlockhash", json!([{ "commitment": "finalized" }]))
            .await?;
        Hash::from_str(&response.value.blockhash)
            .map_err(|e| Error::Other(format!("invalid blockhash {}: {}", response.value.blockhash, e)))
    }

    async fn get_token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<String> {
        let response: WithContext<Value> = self
            .send_request(
                "getTokenAccountsByOwner",
                json!([
                    owner.to_string(),
                    { "mint": mint.to_string() },
                    { "encoding": "jsonParsed" }
                ]),
            )
            .await?;
        Ok(first_token_amount(&response.value))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        let wire = bincode::serialize(transaction)
            .map_err(|e| Error::Other(format!("failed to serialize transaction: {}", e)))?;
        let signature: String = self
            .send_request(
                "sendTransaction",
                json!([
                    base64::encode(wire),
                    { "encoding": "base64", "preflightCommitment": "confirmed" }
                ]),
            )
            .await?;
        Signature::from_str(&signature)
            .map_err(|e| Error::Other(format!("invalid signature {}: {}", signature, e)))
    }
}
