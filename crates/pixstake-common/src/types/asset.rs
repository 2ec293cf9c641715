use {
    serde::{Deserialize, Serialize},
    solana_sdk::pubkey::Pubkey,
};

use super::reward::RewardAmount;

/// Creator entry as reported by the asset index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCreator {
    pub address: Pubkey,
    pub verified: bool,
}

/// An NFT as listed by the asset index, before metadata resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedAsset {
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub creators: Vec<AssetCreator>,
}

impl IndexedAsset {
    /// Whether the asset is part of the staking collection.
    ///
    /// Assets without a creator list are matched on the collection symbol.
    pub fn in_collection(&self, collection_creator: &Pubkey) -> bool {
        match self.creators.first() {
            Some(creator) => creator.address == *collection_creator,
            None => self.symbol == COLLECTION_SYMBOL,
        }
    }
}

pub const COLLECTION_SYMBOL: &str = "PP";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub mint: Pubkey,
    pub metadata_address: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub image: Option<String>,
}

/// An asset held by the vault on behalf of the owner, with its reward figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakedAsset {
    pub asset: AssetRef,
    /// Whole days since the stake started
    pub staking_period: u64,
    pub expected_interest: RewardAmount,
    pub current_interest: RewardAmount,
}
