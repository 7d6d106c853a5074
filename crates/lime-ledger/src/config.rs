//! Construction parameters for a [`Token`](crate::Token), loadable from TOML.
//!
//! ```toml
//! owner = "treasury"
//! cap = "1000000000000000000000000000"
//! snapshot_policy = "owner_only"
//! pause_policy = "idempotent"
//!
//! [metadata]
//! name = "iMe Lab"
//! symbol = "LIME"
//! decimals = 18
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{pause::PausePolicy, AccountId, Amount};

/// 1,000,000,000 whole tokens at 18 decimals.
pub const DEFAULT_CAP: Amount = 1_000_000_000 * 10u128.pow(DEFAULT_DECIMALS as u32);

pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Who may call `snapshot()`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    #[default]
    OwnerOnly,
    Open,
}

/// Descriptive token data. Reported, never interpreted by the ledger.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "iMe Lab".to_string(),
            symbol: "LIME".to_string(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenConfig {
    #[serde(default)]
    pub metadata: TokenMetadata,

    /// Initial owner; receives the whole initial supply.
    pub owner: AccountId,

    #[serde(default = "default_cap", with = "crate::amount::decimal")]
    pub cap: Amount,

    /// Minted to the owner at construction. Defaults to the full cap.
    #[serde(
        default,
        with = "crate::amount::decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_supply: Option<Amount>,

    #[serde(default)]
    pub snapshot_policy: SnapshotPolicy,

    #[serde(default)]
    pub pause_policy: PausePolicy,
}

fn default_cap() -> Amount {
    DEFAULT_CAP
}

impl TokenConfig {
    /// Default LIME parameters owned by `owner`.
    pub fn new(owner: impl Into<AccountId>) -> Self {
        Self {
            metadata: TokenMetadata::default(),
            owner: owner.into(),
            cap: DEFAULT_CAP,
            initial_supply: None,
            snapshot_policy: SnapshotPolicy::default(),
            pause_policy: PausePolicy::default(),
        }
    }

    pub fn with_cap(mut self, cap: Amount) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_initial_supply(mut self, initial_supply: Amount) -> Self {
        self.initial_supply = Some(initial_supply);
        self
    }

    pub fn with_snapshot_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.snapshot_policy = policy;
        self
    }

    pub fn with_pause_policy(mut self, policy: PausePolicy) -> Self {
        self.pause_policy = policy;
        self
    }

    pub fn initial_supply(&self) -> Amount {
        self.initial_supply.unwrap_or(self.cap)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.trim().is_empty() {
            return Err(ConfigError::Invalid("owner must not be empty".into()));
        }
        if self.initial_supply() > self.cap {
            return Err(ConfigError::Invalid(format!(
                "initial supply {} exceeds cap {}",
                self.initial_supply(),
                self.cap
            )));
        }
        Ok(())
    }
}
