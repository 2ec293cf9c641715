//! Fixed-point reward amounts and the reward schedule constants.

use {
    serde::{Deserialize, Serialize},
    std::{
        fmt,
        iter::Sum,
        ops::{Add, AddAssign},
    },
};

/// Fixed-point scale of on-chain reward values (8 decimals).
pub const REWARD_PRECISION: u64 = 100_000_000;
pub const DAY_IN_SECONDS: i64 = 24 * 60 * 60;
/// Last day that still earns a projected reward.
pub const MAX_STAKE_PERIOD: u64 = 180;
/// Day from which the full reward is accrued.
pub const REWARD_LAST_DAY: u64 = 180;
/// 0.07438286 reward tokens.
pub const DAILY_REWARD: RewardAmount = RewardAmount::from_units(7_438_286);
/// 1198.30787460 reward tokens, the total a single stake can release.
pub const MAX_REWARD: RewardAmount = RewardAmount::from_units(119_830_787_460);

const CENT: u64 = REWARD_PRECISION / 100;

/// Reward value counted in 1e-8 token units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RewardAmount(u64);

impl RewardAmount {
    pub const ZERO: RewardAmount = RewardAmount(0);

    pub const fn from_units(units: u64) -> Self {
        RewardAmount(units)
    }

    pub const fn units(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_mul(self, factor: u64) -> Option<Self> {
        self.0.checked_mul(factor).map(RewardAmount)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        RewardAmount(self.0.saturating_sub(other.0))
    }

    pub fn saturating_add(self, other: Self) -> Self {
        RewardAmount(self.0.saturating_add(other.0))
    }

    /// Rounds half-up to two decimals.
    pub fn round_to_cents(self) -> Self {
        let rounded = self.0.saturating_add(CENT / 2) / CENT;
        RewardAmount(rounded * CENT)
    }

    /// Lossy conversion for display only.
    pub fn ui_amount(self) -> f64 {
        self.0 as f64 / REWARD_PRECISION as f64
    }
}

impl Add for RewardAmount {
    type Output = RewardAmount;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl AddAssign for RewardAmount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for RewardAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(RewardAmount::ZERO, Add::add)
    }
}

impl fmt::Display for RewardAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / REWARD_PRECISION;
        let frac = self.0 % REWARD_PRECISION;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:08}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}
