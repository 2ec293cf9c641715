use std::str::FromStr;

use async_trait::async_trait;
use pixstake_common::{AssetCreator, Error, IndexedAsset, Result};
use serde::Deserialize;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use super::AssetIndex;

const PAGE_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
struct AssetPage {
    #[serde(default)]
    items: Vec<DasAsset>,
}

#[derive(Debug, Deserialize)]
struct DasAsset {
    id: String,
    #[serde(default)]
    content: DasContent,
    #[serde(default)]
    creators: Vec<DasCreator>,
}

#[derive(Debug, Default, Deserialize)]
struct DasContent {
    #[serde(default)]
    json_uri: String,
    #[serde(default)]
    metadata: DasMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct DasMetadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct DasCreator {
    address: String,
    #[serde(default)]
    verified: bool,
}

impl DasAsset {
    fn into_indexed(self) -> Result<IndexedAsset> {
        let mint = Pubkey::from_str(&self.id)
            .map_err(|e| Error::Other(format!("invalid asset id {}: {}", self.id, e)))?;
        let creators = self
            .creators
            .into_iter()
            .map(|creator| {
                Pubkey::from_str(&creator.address)
                    .map(|address| AssetCreator {
                        address,
                        verified: creator.verified,
                    })
                    .map_err(|e| Error::Other(format!("invalid creator {}: {}", creator.address, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(IndexedAsset {
            mint,
            name: self.content.metadata.name,
            symbol: self.content.metadata.symbol,
            uri: self.content.json_uri,
            creators,
        })
    }
}

/// Asset index backed by the DAS `getAssetsByOwner` RPC method.
#[derive(Debug, Clone)]
pub struct DasAssetIndex {
    client: reqwest::Client,
    endpoint: String,
}

impl DasAssetIndex {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn fetch_page(&self, owner: &Pubkey, page: usize) -> Result<AssetPage> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": "pixstake",
            "method": "getAssetsByOwner",
            "params": {
                "ownerAddress": owner.to_string(),
                "page": page,
                "limit": PAGE_LIMIT,
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        parse_page(response)
    }
}

fn parse_page(response: serde_json::Value) -> Result<AssetPage> {
    if let Some(error) = response.get("error") {
        return Err(Error::Rpc {
            code: error.get("code").and_then(|c| c.as_i64()).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("getAssetsByOwner failed")
                .to_string(),
        });
    }
    let result = response
        .get("result")
        .cloned()
        .ok_or_else(|| Error::Network("getAssetsByOwner returned no result".to_string()))?;
    Ok(serde_json::from_value(result)?)
}

fn into_indexed_assets(items: Vec<DasAsset>) -> Vec<IndexedAsset> {
    items
        .into_iter()
        .filter_map(|item| match item.into_indexed() {
            Ok(asset) => Some(asset),
            Err(e) => {
                warn!("Skipping malformed asset: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl AssetIndex for DasAssetIndex {
    async fn find_assets_by_owner(&self, owner: &Pubkey) -> Result<Vec<IndexedAsset>> {
        let mut assets = Vec::new();
        let mut page = 1;
        loop {
            let items = self.fetch_page(owner, page).await?.items;
            let count = items.len();
            assets.extend(into_indexed_assets(items));
            if count < PAGE_LIMIT {
                break;
            }
            page += 1;
        }
        debug!("Found {} assets for {}", assets.len(), owner);
        Ok(assets)
    }
}
