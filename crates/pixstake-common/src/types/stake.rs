//! Stake record types
//!
//! Layout of the staking program's per-mint account, little endian:
//!
//! | offset | size | field     |
//! |--------|------|-----------|
//! | 0      | 8    | timestamp |
//! | 8      | 32   | staker    |
//! | 40     | 32   | mint      |
//! | 72     | 1    | active    |
//! | 73     | 8    | withdrawn |
//! | 81     | 8    | harvested |

use {
    serde::{Deserialize, Serialize},
    solana_sdk::pubkey::Pubkey,
};

use super::reward::RewardAmount;

pub const TIMESTAMP_OFFSET: usize = 0;
pub const STAKER_OFFSET: usize = 8;
pub const MINT_OFFSET: usize = 40;
pub const ACTIVE_OFFSET: usize = 72;
pub const WITHDRAWN_OFFSET: usize = 73;
pub const HARVESTED_OFFSET: usize = 81;
pub const STAKE_RECORD_LEN: usize = 89;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    /// Unix seconds at which the asset was staked
    pub timestamp: u64,
    pub staker: Pubkey,
    pub mint: Pubkey,
    pub active: bool,
    /// Reward already paid out to the staker
    pub withdrawn: RewardAmount,
    /// Cumulative reward released, checked against the cap
    pub harvested: RewardAmount,
}
