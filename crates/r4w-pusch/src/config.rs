//! # Configuration System
//!
//! YAML configuration of the PUSCH receiver:
//!
//! - LDPC decoder settings (iterations, early stop, codeword capacity)
//! - Channel estimate dimensions, which also bound accepted descriptors
//! - Softbuffer pool dimensions
//! - Logging
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `R4W_PUSCH_CONFIG` environment variable
//! 2. `./r4w-pusch.yaml` (current directory)
//! 3. `~/.config/r4w/pusch.yaml` (user config)
//! 4. `/etc/r4w/pusch.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! decoder:
//!   nof_ldpc_iterations: 10
//!   early_stop: true
//!
//! channel_estimate:
//!   nof_prb: 106
//!   nof_rx_ports: 2
//!
//! softbuffer_pool:
//!   max_softbuffers: 32
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observe::LogConfig;
use crate::pusch::{ChannelEstimateDimensions, CODEWORD_MAX_SIZE, MAX_NOF_PRB};
use crate::softbuffer_pool::SoftbufferPoolConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "R4W_PUSCH_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),
    #[error("failed to read config: {0}")]
    ReadError(String),
    #[error("failed to parse config: {0}")]
    ParseError(String),
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// LDPC decoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderSettings {
    /// Maximum LDPC iterations per codeblock
    pub nof_ldpc_iterations: u32,
    /// Stop iterating as soon as the codeblock CRC passes
    pub early_stop: bool,
    /// Largest codeword, in soft bits, a decoder accepts
    pub max_codeword_size: usize,
    /// Min-sum check node scaling factor
    pub min_sum_scaling: f32,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            nof_ldpc_iterations: 6,
            early_stop: true,
            max_codeword_size: CODEWORD_MAX_SIZE,
            min_sum_scaling: 0.8,
        }
    }
}

/// Complete PUSCH receiver configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PuschRxConfig {
    pub decoder: DecoderSettings,
    pub channel_estimate: ChannelEstimateDimensions,
    pub softbuffer_pool: SoftbufferPoolConfig,
    pub logging: LogConfig,
}

impl PuschRxConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = Path::new(&path);
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            return Self::load_from(path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading PUSCH configuration");
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./r4w-pusch.yaml")];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "r4w") {
            paths.push(dirs.config_dir().join("pusch.yaml"));
        }
        paths.push(PathBuf::from("/etc/r4w/pusch.yaml"));
        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let decoder = &self.decoder;
        if decoder.nof_ldpc_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "nof_ldpc_iterations must be > 0".to_string(),
            ));
        }
        if decoder.max_codeword_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_codeword_size must be > 0".to_string(),
            ));
        }
        if !(decoder.min_sum_scaling > 0.0 && decoder.min_sum_scaling <= 1.0) {
            return Err(ConfigError::ValidationError(
                "min_sum_scaling must be in (0, 1]".to_string(),
            ));
        }

        let ce = &self.channel_estimate;
        if ce.nof_prb == 0 || ce.nof_prb > MAX_NOF_PRB {
            return Err(ConfigError::ValidationError(format!(
                "channel_estimate.nof_prb must be 1-{}",
                MAX_NOF_PRB
            )));
        }
        if ce.nof_symbols == 0 || ce.nof_rx_ports == 0 || ce.nof_tx_layers == 0 {
            return Err(ConfigError::ValidationError(
                "channel_estimate dimensions must be > 0".to_string(),
            ));
        }

        if self.softbuffer_pool.max_softbuffers == 0 {
            return Err(ConfigError::ValidationError(
                "max_softbuffers must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}
