use async_trait::async_trait;
use pixstake_common::Result;
use serde::Deserialize;

use super::MetadataFetcher;

#[derive(Debug, Deserialize)]
struct OffChainMetadata {
    image: Option<String>,
}

/// Reads the `image` field of off-chain NFT metadata over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch_image(&self, uri: &str) -> Result<Option<String>> {
        let metadata = self
            .client
            .get(uri)
            .send()
            .await?
            .error_for_status()?
            .json::<OffChainMetadata>()
            .await?;
        Ok(metadata.image)
    }
}
