//! Common data types used throughout the pixstake system

pub mod asset;
pub mod instruction;
pub mod reward;
pub mod stake;

pub use asset::{AssetCreator, AssetRef, IndexedAsset, StakedAsset, COLLECTION_SYMBOL};
pub use instruction::{ActionFlow, PlatformInstruction};
pub use reward::{
    RewardAmount, DAILY_REWARD, DAY_IN_SECONDS, MAX_REWARD, MAX_STAKE_PERIOD,
    REWARD_LAST_DAY, REWARD_PRECISION,
};
pub use stake::{StakeRecord, STAKE_RECORD_LEN};
