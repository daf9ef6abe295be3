//! `lendrisk.toml` loading
//!
//! ```toml
//! log_level = "info"
//!
//! [oracle]
//! max_confidence_fraction = "0.05"
//! confidence_multiplier = "1"
//! max_age_secs = 60
//!
//! [looping]
//! epsilon = "0.0001"
//! max_iterations = 16
//! max_slippage_bps = 100
//! ```
//!
//! Every key is optional. Decimal values are strings.

use lendrisk_looping::{LoopError, PlannerConfig};
use lendrisk_oracle::{OracleConfig, OracleError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "lendrisk.toml";

/// Why a `lendrisk.toml` was rejected
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("lendrisk config {} does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("cannot read lendrisk config {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lendrisk config is not valid TOML: {0}")]
    Malformed(#[from] toml::de::Error),

    #[error("log_level must name a tracing filter")]
    EmptyLogLevel,

    #[error("[oracle] max_age_secs must be at least 1, every price would be stale")]
    ZeroOracleMaxAge,

    #[error("[oracle] {0}")]
    Oracle(#[from] OracleError),

    #[error("[looping] {0}")]
    Looping(#[from] LoopError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendriskConfig {
    /// Default tracing filter; `RUST_LOG` wins when set
    pub log_level: String,
    pub oracle: OracleConfig,
    pub looping: PlannerConfig,
}

impl Default for LendriskConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            oracle: OracleConfig::default(),
            looping: PlannerConfig::default(),
        }
    }
}

#[derive(Debug)]
pub struct ConfigLoader {
    config: LendriskConfig,
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader with the default configuration
    pub fn new() -> Self {
        Self {
            config: LendriskConfig::default(),
            config_path: None,
        }
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let config: LendriskConfig = toml::from_str(&content)?;
        Self::validate(&config)?;

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    pub fn load_str(content: &str) -> Result<Self, ConfigError> {
        let config: LendriskConfig = toml::from_str(content)?;
        Self::validate(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_PATH`]
    /// is read when present and defaults are used otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load_file(DEFAULT_CONFIG_PATH),
            None => Ok(Self::new()),
        }
    }

    pub fn get(&self) -> &LendriskConfig {
        &self.config
    }

    pub fn into_config(self) -> LendriskConfig {
        self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn validate(config: &LendriskConfig) -> Result<(), ConfigError> {
        if config.log_level.trim().is_empty() {
            return Err(ConfigError::EmptyLogLevel);
        }
        if config.oracle.max_age_secs == 0 {
            return Err(ConfigError::ZeroOracleMaxAge);
        }
        config.oracle.validate()?;
        config.looping.validate()?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
