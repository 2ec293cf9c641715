use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between signature status polls
    pub poll_interval_ms: u64,
    /// Status polls before an action is abandoned
    pub max_confirmation_polls: u32,
    /// Pause between a finalized stake and the list refresh
    pub refresh_delay_ms: u64,
    /// Attempts to read a block time for the current slot
    pub clock_retry_attempts: u32,
    pub clock_retry_delay_ms: u64,
    /// Background refresh period
    pub refresh_interval_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            max_confirmation_polls: 120,
            refresh_delay_ms: 4_000,
            clock_retry_attempts: 10,
            clock_retry_delay_ms: 500,
            refresh_interval_secs: 3_600,
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn clock_retry_delay(&self) -> Duration {
        Duration::from_millis(self.clock_retry_delay_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Zero delays, for driving the pipeline in tests.
    pub fn immediate() -> Self {
        Self {
            poll_interval_ms: 0,
            refresh_delay_ms: 0,
            clock_retry_delay_ms: 0,
            ..Self::default()
        }
    }
}
