use pixstake_common::{AssetRef, StakedAsset};
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    /// Reward token UI amount
    pub token_balance: String,
    pub wallet_assets: Vec<AssetRef>,
    pub wallet_asset_count: usize,
    pub staked_assets: Vec<StakedAsset>,
    /// Collection assets held by the vault across all stakers
    pub staked_in_pool: usize,
    pub selected: Option<StakedAsset>,
    pub loading_wallet_assets: bool,
    pub loading_staked_assets: bool,
    pub error: Option<String>,
}

impl WalletState {
    pub fn stake_succeeded(&mut self, count: usize) {
        self.staked_in_pool += count;
    }

    pub fn unstake_succeeded(&mut self, mint: &Pubkey) {
        self.staked_assets.retain(|staked| staked.asset.mint != *mint);
        self.staked_in_pool = self.staked_in_pool.saturating_sub(1);
        if self.selected.as_ref().map(|s| s.asset.mint) == Some(*mint) {
            self.selected = None;
        }
    }

    pub fn select(&mut self, mint: &Pubkey) -> bool {
        self.selected = self
            .staked_assets
            .iter()
            .find(|staked| staked.asset.mint == *mint)
            .cloned();
        self.selected.is_some()
    }

    pub fn fail(&mut self, message: String) {
        self.loading_wallet_assets = false;
        self.loading_staked_assets = false;
        self.error = Some(message);
    }
}
