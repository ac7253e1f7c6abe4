use crate::error::{Error, TribunalResult};
use crate::reputation::ReputationRules;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MIN_STAKE_AMOUNT: u64 = 1000;
pub const DEFAULT_VOTING_WINDOW: u64 = 144;
pub const DEFAULT_APPEAL_WINDOW: u64 = 144;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationConfig {
    #[serde(default)]
    pub staking: StakingSection,
    #[serde(default)]
    pub voting: VotingSection,
    #[serde(default)]
    pub reputation: ReputationRules,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingSection {
    #[serde(default = "default_min_stake_amount")]
    pub min_stake_amount: u64,
}

fn default_min_stake_amount() -> u64 {
    DEFAULT_MIN_STAKE_AMOUNT
}

impl Default for StakingSection {
    fn default() -> Self {
        Self {
            min_stake_amount: default_min_stake_amount(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSection {
    #[serde(default = "default_vote_reputation_min")]
    pub vote_reputation_min: u64,
    #[serde(default = "default_category_creation_reputation_min")]
    pub category_creation_reputation_min: u64,
    #[serde(default = "default_voting_window")]
    pub voting_window: u64,
    #[serde(default = "default_appeal_window")]
    pub appeal_window: u64,
}

fn default_vote_reputation_min() -> u64 {
    50
}
fn default_category_creation_reputation_min() -> u64 {
    100
}
fn default_voting_window() -> u64 {
    DEFAULT_VOTING_WINDOW
}
fn default_appeal_window() -> u64 {
    DEFAULT_APPEAL_WINDOW
}

impl Default for VotingSection {
    fn default() -> Self {
        Self {
            vote_reputation_min: default_vote_reputation_min(),
            category_creation_reputation_min: default_category_creation_reputation_min(),
            voting_window: default_voting_window(),
            appeal_window: default_appeal_window(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> LogFormat {
    LogFormat::Text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ModerationConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> TribunalResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> TribunalResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> TribunalResult<()> {
        if self.staking.min_stake_amount == 0 {
            return Err(Error::Config("min_stake_amount must be > 0".to_string()));
        }

        if self.voting.vote_reputation_min == 0 {
            return Err(Error::Config("vote_reputation_min must be > 0".to_string()));
        }

        if self.voting.voting_window == 0 {
            return Err(Error::Config("voting_window must be > 0".to_string()));
        }

        if self.voting.appeal_window == 0 {
            return Err(Error::Config("appeal_window must be > 0".to_string()));
        }

        if self.reputation.stake_per_reputation == 0 {
            return Err(Error::Config("stake_per_reputation must be > 0".to_string()));
        }

        if self.reputation.history_batch_size == 0 {
            return Err(Error::Config("history_batch_size must be > 0".to_string()));
        }

        Ok(())
    }

    pub fn to_toml(&self) -> TribunalResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}

pub fn generate_default<P: AsRef<Path>>(output: P) -> TribunalResult<()> {
    let config = ModerationConfig::default();
    let toml = config.to_toml()?;

    fs::write(output.as_ref(), toml)
        .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

    tracing::info!(path = %output.as_ref().display(), "Generated default config");
    Ok(())
}
