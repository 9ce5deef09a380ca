//! Configuration management for LedgerChain

use crate::error::ChainError;
use crate::miner::{validate_difficulty, MiningControl, DEFAULT_BATCH_SIZE};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const DEFAULT_MINER_REWARD: u64 = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_miner_reward")]
    pub miner_reward: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            miner_reward: DEFAULT_MINER_REWARD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Wall-clock bound for one mining round. Unbounded when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_secs: None,
        }
    }
}

impl MinerConfig {
    /// Builds the control for one round; the deadline starts counting now.
    pub fn mining_control(&self) -> MiningControl {
        let control = MiningControl::unbounded().with_batch_size(self.batch_size);
        match self.timeout_secs {
            Some(secs) => control.with_timeout(Duration::from_secs(secs)),
            None => control,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ChainError> {
        validate_difficulty(self.chain.difficulty)?;
        if self.miner.batch_size == 0 {
            return Err(ChainError::ConfigError(
                "miner.batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

fn default_miner_reward() -> u64 {
    DEFAULT_MINER_REWARD
}

fn default_batch_size() -> u64 {
    DEFAULT_BATCH_SIZE
}

pub fn parse_config(config_str: &str) -> Result<Config, ChainError> {
    let config: Config = toml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

/// Loads `path`, falling back to defaults when the file does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)?;
    parse_config(&config_str)
}
