//! Reward accrual for staked assets
//!
//! Accrual is linear in the day index: day 1 earns nothing, day N earns
//! `(N - 1)` daily units. All sums are taken in 1e-8 fixed-point units, one
//! term per day, so they match the on-chain accounting exactly.

use pixstake_common::{
    RewardAmount, StakeRecord, StakedAsset, DAILY_REWARD, DAY_IN_SECONDS, MAX_REWARD,
    MAX_STAKE_PERIOD, REWARD_LAST_DAY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardCalculator {
    pub daily_reward: RewardAmount,
    pub max_reward: RewardAmount,
    pub max_stake_period: u64,
    pub reward_last_day: u64,
}

impl Default for RewardCalculator {
    fn default() -> Self {
        Self {
            daily_reward: DAILY_REWARD,
            max_reward: MAX_REWARD,
            max_stake_period: MAX_STAKE_PERIOD,
            reward_last_day: REWARD_LAST_DAY,
        }
    }
}

impl RewardCalculator {
    /// Whole days between the stake start and `now`.
    pub fn stake_period(&self, now: i64, record: Option<&StakeRecord>) -> u64 {
        let Some(record) = record else {
            return 0;
        };
        let now = u64::try_from(now).unwrap_or(0);
        if record.timestamp >= now {
            return 0;
        }
        (now - record.timestamp) / DAY_IN_SECONDS as u64
    }

    /// Projected reward for the current period, limited by what is left under
    /// the cap.
    pub fn expected_interest(&self, now: i64, record: Option<&StakeRecord>) -> RewardAmount {
        let Some(record) = record else {
            return RewardAmount::ZERO;
        };
        let periods = self.stake_period(now, Some(record));

        let reward = if periods > self.max_stake_period {
            RewardAmount::ZERO
        } else {
            self.daily_reward
                .checked_mul(periods)
                .unwrap_or(self.max_reward)
        };

        if record.harvested.saturating_add(reward) > self.max_reward {
            return self.max_reward.saturating_sub(record.harvested);
        }
        reward
    }

    /// Vested reward the staker can still withdraw.
    pub fn current_interest(&self, record: &StakeRecord, now: i64) -> RewardAmount {
        let periods = self.stake_period(now, Some(record));
        if periods <= 1 {
            return RewardAmount::ZERO;
        }
        if record.harvested >= self.max_reward {
            return RewardAmount::ZERO;
        }

        let accrued = if periods >= self.reward_last_day {
            self.max_reward
        } else {
            self.accrued_for_days(periods)
        };

        accrued.saturating_sub(record.withdrawn)
    }

    /// Sum of daily rewards for `days` days, one term per day.
    pub fn accrued_for_days(&self, days: u64) -> RewardAmount {
        let mut total = RewardAmount::ZERO;
        for day in 1..=days {
            let daily = self
                .daily_reward
                .checked_mul(day - 1)
                .unwrap_or(self.max_reward);
            total += daily;
        }
        total
    }

    /// Accrued total after `days` days, rounded to cents for display.
    pub fn total_reward_for_days(&self, days: u64) -> RewardAmount {
        self.accrued_for_days(days).round_to_cents()
    }

    /// Combined projected reward of all staked assets, rounded to cents.
    pub fn total_expected_interest(&self, assets: &[StakedAsset]) -> RewardAmount {
        assets
            .iter()
            .map(|asset| asset.expected_interest)
            .sum::<RewardAmount>()
            .round_to_cents()
    }
}
