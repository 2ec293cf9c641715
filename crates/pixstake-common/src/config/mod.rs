//! Configuration types for the pixstake system
//!
//! Every address the client talks to has a development and a production value;
//! [`RuntimeMode`] picks which set is live.

mod addresses;
mod timing;

pub use addresses::ProgramAddresses;
pub use timing::TimingConfig;

use {
    serde::{Deserialize, Serialize},
    std::{fmt, fs, path::Path, str::FromStr},
    tracing::{debug, warn},
};

use crate::errors::{Error, Result};

pub const DEFAULT_TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const DEFAULT_ASSOCIATED_TOKEN_PROGRAM: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";
pub const DEFAULT_METADATA_PROGRAM: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl FromStr for RuntimeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeMode::Development),
            "production" | "prod" | "mainnet" => Ok(RuntimeMode::Production),
            other => Err(Error::Config(format!("unknown runtime mode: {}", other))),
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Development => write!(f, "development"),
            RuntimeMode::Production => write!(f, "production"),
        }
    }
}

/// Per-cluster endpoints and program identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub rpc_url: String,
    /// DAS-capable endpoint for asset lookups; falls back to `rpc_url`.
    #[serde(default)]
    pub das_url: Option<String>,
    pub program_id: String,
    pub vault: String,
    pub collection_creator: String,
    pub reward_mint: String,
}

impl ClusterConfig {
    pub fn das_endpoint(&self) -> &str {
        self.das_url.as_deref().unwrap_or(&self.rpc_url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingConfig {
    #[serde(default)]
    pub mode: RuntimeMode,
    pub development: ClusterConfig,
    pub production: ClusterConfig,
    #[serde(default = "default_token_program")]
    pub token_program: String,
    #[serde(default = "default_associated_token_program")]
    pub associated_token_program: String,
    #[serde(default = "default_metadata_program")]
    pub metadata_program: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_token_program() -> String {
    DEFAULT_TOKEN_PROGRAM.to_string()
}

fn default_associated_token_program() -> String {
    DEFAULT_ASSOCIATED_TOKEN_PROGRAM.to_string()
}

fn default_metadata_program() -> String {
    DEFAULT_METADATA_PROGRAM.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl StakingConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str::<Self>(&contents)?)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `PIXSTAKE_*` variables; production values carry a
    /// `_MAINNET` suffix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("PIXSTAKE_MODE") {
            Some(raw) => raw.parse()?,
            None => RuntimeMode::default(),
        };

        let cluster = |suffix: &str, default_rpc: Option<&str>| -> Result<ClusterConfig> {
            let var = |name: &str| lookup(&format!("PIXSTAKE_{}{}", name, suffix));
            let required = |name: &str| {
                var(name).ok_or_else(|| {
                    Error::Config(format!("missing PIXSTAKE_{}{}", name, suffix))
                })
            };
            let rpc_url = match (var("RPC_URL"), default_rpc) {
                (Some(url), _) => url,
                (None, Some(url)) => url.to_string(),
                (None, None) => required("RPC_URL")?,
            };
            Ok(ClusterConfig {
                rpc_url,
                das_url: var("DAS_URL"),
                program_id: required("PROGRAM_ID")?,
                vault: required("VAULT_ADDRESS")?,
                collection_creator: required("COLLECTION_CREATOR")?,
                reward_mint: required("REWARD_MINT")?,
            })
        };

        // Only the active cluster has to be fully specified.
        let (development, production) = match mode {
            RuntimeMode::Development => {
                let dev = cluster("", Some(DEVNET_RPC_URL))?;
                let prod = cluster("_MAINNET", None).unwrap_or_else(|e| {
                    debug!("Production cluster not configured ({}), mirroring development", e);
                    dev.clone()
                });
                (dev, prod)
            }
            RuntimeMode::Production => {
                let prod = cluster("_MAINNET", None)?;
                let dev = cluster("", Some(DEVNET_RPC_URL)).unwrap_or_else(|e| {
                    debug!("Development cluster not configured ({}), mirroring production", e);
                    prod.clone()
                });
                (dev, prod)
            }
        };

        let mut timing = TimingConfig::default();
        if let Some(ms) = lookup("PIXSTAKE_POLL_INTERVAL_MS") {
            timing.poll_interval_ms = parse_number("PIXSTAKE_POLL_INTERVAL_MS", &ms)?;
        }
        if let Some(n) = lookup("PIXSTAKE_MAX_CONFIRMATION_POLLS") {
            timing.max_confirmation_polls = parse_number("PIXSTAKE_MAX_CONFIRMATION_POLLS", &n)?;
        }
        if let Some(ms) = lookup("PIXSTAKE_REFRESH_DELAY_MS") {
            timing.refresh_delay_ms = parse_number("PIXSTAKE_REFRESH_DELAY_MS", &ms)?;
        }
        if let Some(n) = lookup("PIXSTAKE_CLOCK_RETRY_ATTEMPTS") {
            timing.clock_retry_attempts = parse_number("PIXSTAKE_CLOCK_RETRY_ATTEMPTS", &n)?;
        }
        if let Some(ms) = lookup("PIXSTAKE_CLOCK_RETRY_DELAY_MS") {
            timing.clock_retry_delay_ms = parse_number("PIXSTAKE_CLOCK_RETRY_DELAY_MS", &ms)?;
        }
        if let Some(secs) = lookup("PIXSTAKE_REFRESH_INTERVAL_SECS") {
            timing.refresh_interval_secs = parse_number("PIXSTAKE_REFRESH_INTERVAL_SECS", &secs)?;
        }

        if timing.max_confirmation_polls == 0 {
            warn!("PIXSTAKE_MAX_CONFIRMATION_POLLS is 0, every action will time out");
        }

        Ok(Self {
            mode,
            development,
            production,
            token_program: lookup("PIXSTAKE_TOKEN_PROGRAM").unwrap_or_else(default_token_program),
            associated_token_program: lookup("PIXSTAKE_ASSOCIATED_TOKEN_PROGRAM")
                .unwrap_or_else(default_associated_token_program),
            metadata_program: lookup("PIXSTAKE_METADATA_PROGRAM")
                .unwrap_or_else(default_metadata_program),
            timing,
            log_level: lookup("RUST_LOG").unwrap_or_else(default_log_level),
        })
    }

    /// The cluster selected by the runtime mode.
    pub fn active(&self) -> &ClusterConfig {
        match self.mode {
            RuntimeMode::Development => &self.development,
            RuntimeMode::Production => &self.production,
        }
    }

    pub fn addresses(&self) -> Result<ProgramAddresses> {
        ProgramAddresses::resolve(self)
    }
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| Error::Config(format!("{} is not a number: {}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const PROGRAM: &str = "Stake11111111111111111111111111111111111111";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn dev_vars() -> HashMap<String, String> {
        env(&[
            ("PIXSTAKE_PROGRAM_ID", PROGRAM),
            ("PIXSTAKE_VAULT_ADDRESS", "11111111111111111111111111111111"),
            ("PIXSTAKE_COLLECTION_CREATOR", "11111111111111111111111111111111"),
            ("PIXSTAKE_REWARD_MINT", "11111111111111111111111111111111"),
        ])
    }

    #[test]
    fn test_from_lookup_defaults_to_development() {
        let vars = dev_vars();
        let config = StakingConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.active().rpc_url, DEVNET_RPC_URL);
        assert_eq!(config.active().program_id, PROGRAM);
        assert_eq!(config.token_program, DEFAULT_TOKEN_PROGRAM);
        assert_eq!(config.timing.poll_interval_ms, 5_000);
    }

    #[test]
    fn test_production_mode_requires_mainnet_values() {
        let mut vars = dev_vars();
        vars.insert("PIXSTAKE_MODE".to_string(), "production".to_string());

        let err = StakingConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        vars.insert("PIXSTAKE_RPC_URL_MAINNET".to_string(), "https://rpc.example".to_string());
        vars.insert("PIXSTAKE_PROGRAM_ID_MAINNET".to_string(), PROGRAM.to_string());
        vars.insert("PIXSTAKE_VAULT_ADDRESS_MAINNET".to_string(), PROGRAM.to_string());
        vars.insert("PIXSTAKE_COLLECTION_CREATOR_MAINNET".to_string(), PROGRAM.to_string());
        vars.insert("PIXSTAKE_REWARD_MINT_MAINNET".to_string(), PROGRAM.to_string());

        let config = StakingConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.mode, RuntimeMode::Production);
        assert_eq!(config.active().rpc_url, "https://rpc.example");
        assert_eq!(config.active().vault, PROGRAM);
    }

    #[test]
    fn test_unconfigured_cluster_mirrors_active_one() {
        let vars = dev_vars();
        let config = StakingConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.production.rpc_url, config.development.rpc_url);
        assert_eq!(config.production.program_id, PROGRAM);
    }

    #[test]
    fn test_timing_overrides() {
        let mut vars = dev_vars();
        vars.insert("PIXSTAKE_CLOCK_RETRY_ATTEMPTS".to_string(), "3".to_string());
        vars.insert("PIXSTAKE_CLOCK_RETRY_DELAY_MS".to_string(), "250".to_string());
        vars.insert("PIXSTAKE_REFRESH_DELAY_MS".to_string(), "0".to_string());

        let config = StakingConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.timing.clock_retry_attempts, 3);
        assert_eq!(config.timing.clock_retry_delay_ms, 250);
        assert_eq!(config.timing.refresh_delay_ms, 0);
        assert_eq!(config.timing.poll_interval_ms, 5_000);

        vars.insert("PIXSTAKE_CLOCK_RETRY_DELAY_MS".to_string(), "soon".to_string());
        let err = StakingConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_mode_is_rejected() {
        assert!("staging".parse::<RuntimeMode>().is_err());
        assert_eq!("MAINNET".parse::<RuntimeMode>().unwrap(), RuntimeMode::Production);
    }

    #[test]
    fn test_from_file() {
        let json = serde_json::json!({
            "mode": "production",
            "development": {
                "rpc_url": DEVNET_RPC_URL,
                "program_id": PROGRAM,
                "vault": PROGRAM,
                "collection_creator": PROGRAM,
                "reward_mint": PROGRAM
            },
            "production": {
                "rpc_url": "https://mainnet.example",
                "das_url": "https://das.example",
                "program_id": PROGRAM,
                "vault": PROGRAM,
                "collection_creator": PROGRAM,
                "reward_mint": PROGRAM
            },
            "timing": { "max_confirmation_polls": 7 }
        });
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json).unwrap();

        let config = StakingConfig::from_file(file.path()).unwrap();
        assert_eq!(config.active().das_endpoint(), "https://das.example");
        assert_eq!(config.development.das_endpoint(), DEVNET_RPC_URL);
        assert_eq!(config.timing.max_confirmation_polls, 7);
        assert_eq!(config.timing.poll_interval_ms, 5_000);
        assert_eq!(config.metadata_program, DEFAULT_METADATA_PROGRAM);
    }
}
