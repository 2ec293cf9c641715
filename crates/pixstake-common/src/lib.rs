pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

pub use config::{ClusterConfig, ProgramAddresses, RuntimeMode, StakingConfig, TimingConfig};
pub use errors::{Error, FailureKind, Result};
pub use types::*;
