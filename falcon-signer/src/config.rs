//! Configuration loading.
//!
//! Loads and validates the signer configuration from a file or from the
//! environment.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{FalconError, Result};
use crate::keygen::DEFAULT_KEYGEN_ATTEMPTS;
use crate::params::ParameterSet;
use crate::sign::DEFAULT_SIGN_ATTEMPTS;

/// Signer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FalconConfig {
    /// `"falcon-512"` or `"falcon-1024"`
    pub parameter_set: ParameterSet,
    /// Candidate bases tried per key generation
    pub keygen_max_attempts: u32,
    /// Sampling attempts per signature
    pub sign_max_attempts: u32,
}

impl Default for FalconConfig {
    fn default() -> Self {
        Self {
            parameter_set: ParameterSet::default(),
            keygen_max_attempts: DEFAULT_KEYGEN_ATTEMPTS,
            sign_max_attempts: DEFAULT_SIGN_ATTEMPTS,
        }
    }
}

/// Load the configuration from a file (TOML, JSON or YAML, by extension).
///
/// # Example
/// ```no_run
/// use falcon_signer::config::load_config;
///
/// let config = load_config("falcon.toml").expect("Failed to load config");
/// println!("Parameter set: {:?}", config.parameter_set);
/// ```
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<FalconConfig> {
    let config = Config::builder()
        .add_source(File::from(config_path.as_ref()))
        .build()
        .map_err(|e| FalconError::Config(format!("Failed to load config file: {}", e)))?;

    let falcon_config: FalconConfig = config
        .try_deserialize()
        .map_err(|e| FalconError::Config(format!("Failed to parse config: {}", e)))?;

    validate_config(&falcon_config)?;
    Ok(falcon_config)
}

/// Load the configuration from environment variables.
///
/// Prefix: `FALCON_`, e.g. `FALCON_PARAMETER_SET=falcon-1024`,
/// `FALCON_SIGN_MAX_ATTEMPTS=128`.
pub fn load_config_from_env() -> Result<FalconConfig> {
    let config = Config::builder()
        .add_source(Environment::with_prefix("FALCON").try_parsing(true))
        .build()
        .map_err(|e| FalconError::Config(format!("Failed to load env vars: {}", e)))?;

    let falcon_config: FalconConfig = config
        .try_deserialize()
        .map_err(|e| FalconError::Config(format!("Failed to parse env config: {}", e)))?;

    validate_config(&falcon_config)?;
    Ok(falcon_config)
}

/// Reject attempt limits of zero.
pub fn validate_config(config: &FalconConfig) -> Result<()> {
    if config.keygen_max_attempts == 0 {
        return Err(FalconError::Config(
            "keygen_max_attempts must be greater than 0".to_string(),
        ));
    }
    if config.sign_max_attempts == 0 {
        return Err(FalconError::Config(
            "sign_max_attempts must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
