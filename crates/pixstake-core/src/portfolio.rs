//! Batched reads of stake records and the asset lists built on top of them

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use pixstake_common::{
    AssetRef, Error, IndexedAsset, ProgramAddresses, Result, StakeRecord, StakedAsset,
    TimingConfig,
};
use solana_sdk::pubkey::Pubkey;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    client::{AssetIndex, ChainClient, MetadataFetcher, MAX_MULTIPLE_ACCOUNTS},
    decoder::decode_stake_record,
    deriver::AddressDeriver,
    rewards::RewardCalculator,
};

pub struct StakePortfolio {
    chain: Arc<dyn ChainClient>,
    index: Arc<dyn AssetIndex>,
    metadata: Arc<dyn MetadataFetcher>,
    deriver: AddressDeriver,
    calculator: RewardCalculator,
    timing: TimingConfig,
}

impl StakePortfolio {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        index: Arc<dyn AssetIndex>,
        metadata: Arc<dyn MetadataFetcher>,
        addresses: ProgramAddresses,
        timing: TimingConfig,
    ) -> Self {
        Self {
            chain,
            index,
            metadata,
            deriver: AddressDeriver::new(addresses),
            calculator: RewardCalculator::default(),
            timing,
        }
    }

    pub fn with_calculator(mut self, calculator: RewardCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn calculator(&self) -> &RewardCalculator {
        &self.calculator
    }

    /// Stake records for `mints`, one entry per mint in input order.
    ///
    /// Lookups go out in groups of [`MAX_MULTIPLE_ACCOUNTS`], all groups at
    /// once. Records that fail to decode are reported as absent.
    pub async fn fetch_stake_records(&self, mints: &[Pubkey]) -> Result<Vec<Option<StakeRecord>>> {
        let addresses = mints
            .iter()
            .map(|mint| self.deriver.stake_data(mint).map(|derived| derived.address))
            .collect::<Result<Vec<_>>>()?;

        let groups = try_join_all(
            addresses
                .chunks(MAX_MULTIPLE_ACCOUNTS)
                .map(|chunk| self.fetch_group(chunk)),
        )
        .await?;

        let records = groups
            .into_iter()
            .flatten()
            .zip(&addresses)
            .map(|(data, address)| match decode_stake_record(data.as_deref()) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Ignoring stake account {}: {}", address, e);
                    None
                }
            })
            .collect();
        Ok(records)
    }

    async fn fetch_group(&self, chunk: &[Pubkey]) -> Result<Vec<Option<Vec<u8>>>> {
        let accounts = self.chain.get_multiple_accounts(chunk).await?;
        if accounts.len() != chunk.len() {
            return Err(Error::Network(format!(
                "getMultipleAccounts returned {} accounts for {} addresses",
                accounts.len(),
                chunk.len()
            )));
        }
        Ok(accounts)
    }

    /// Cluster time at the current slot.
    pub async fn current_time(&self) -> Result<i64> {
        let slot = self.chain.get_slot().await?;
        let attempts = self.timing.clock_retry_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(time) = self.chain.get_block_time(slot).await? {
                return Ok(time);
            }
            debug!("Block time for slot {} not available (attempt {})", slot, attempt);
            if attempt < attempts {
                sleep(self.timing.clock_retry_delay()).await;
            }
        }
        Err(Error::Network(format!(
            "block time for slot {} unavailable after {} attempts",
            slot, attempts
        )))
    }

    async fn collection_assets(&self, owner: &Pubkey) -> Result<Vec<IndexedAsset>> {
        let creator = self.deriver.addresses().collection_creator;
        let assets = self.index.find_assets_by_owner(owner).await?;
        Ok(assets
            .into_iter()
            .filter(|asset| asset.in_collection(&creator))
            .collect())
    }

    async fn resolve_images<'a, I>(&self, assets: I) -> Vec<Option<String>>
    where
        I: IntoIterator<Item = &'a IndexedAsset>,
    {
        join_all(assets.into_iter().map(|asset| async move {
            match self.metadata.fetch_image(&asset.uri).await {
                Ok(image) => image,
                Err(e) => {
                    warn!("No image for {}: {}", asset.mint, e);
                    None
                }
            }
        }))
        .await
    }

    fn asset_ref(&self, asset: IndexedAsset, image: Option<String>) -> Result<AssetRef> {
        let metadata_address = self.deriver.metadata(&asset.mint)?.address;
        Ok(AssetRef {
            mint: asset.mint,
            metadata_address,
            name: asset.name,
            symbol: asset.symbol,
            uri: asset.uri,
            image,
        })
    }

    /// Assets the vault holds on behalf of `owner`, with their reward figures.
    pub async fn staked_assets_for_owner(&self, owner: &Pubkey) -> Result<Vec<StakedAsset>> {
        let vault = self.deriver.addresses().vault;
        let held = self.collection_assets(&vault).await?;
        let mints: Vec<Pubkey> = held.iter().map(|asset| asset.mint).collect();
        let records = self.fetch_stake_records(&mints).await?;
        let now = self.current_time().await?;

        let owned: Vec<(IndexedAsset, StakeRecord)> = held
            .into_iter()
            .zip(records)
            .filter_map(|(asset, record)| {
                record
                    .filter(|record| record.staker == *owner)
                    .map(|record| (asset, record))
            })
            .collect();
        let images = self.resolve_images(owned.iter().map(|(asset, _)| asset)).await;

        let staked = owned
            .into_iter()
            .zip(images)
            .map(|((asset, record), image)| {
                Ok(StakedAsset {
                    asset: self.asset_ref(asset, image)?,
                    staking_period: self.calculator.stake_period(now, Some(&record)),
                    expected_interest: self.calculator.expected_interest(now, Some(&record)),
                    current_interest: self.calculator.current_interest(&record, now),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!("{} staked assets for {}", staked.len(), owner);
        Ok(staked)
    }

    /// Collection assets held directly by `owner`.
    pub async fn wallet_assets(&self, owner: &Pubkey) -> Result<Vec<AssetRef>> {
        let assets = self.collection_assets(owner).await?;
        let images = self.resolve_images(&assets).await;
        assets
            .into_iter()
            .zip(images)
            .map(|(asset, image)| self.asset_ref(asset, image))
            .collect()
    }

    pub async fn wallet_asset_count(&self, owner: &Pubkey) -> Result<usize> {
        Ok(self.collection_assets(owner).await?.len())
    }

    /// Collection assets currently held by the vault, across all stakers.
    pub async fn staked_in_pool_count(&self) -> Result<usize> {
        let vault = self.deriver.addresses().vault;
        Ok(self.collection_assets(&vault).await?.len())
    }

    pub async fn reward_token_balance(&self, owner: &Pubkey) -> Result<String> {
        let reward_mint = self.deriver.addresses().reward_mint;
        self.chain.get_token_balance(owner, &reward_mint).await
    }
}
