use figment::providers::{Env, Format, Toml};
use figment::Figment;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Environment variables prefixed with this value override the defaults.
/// Nested keys are separated by `__`, e.g. `LAKEPATH__SCAN__BATCH_SIZE`.
pub const CONFIG_ENV_PREFIX: &str = "LAKEPATH__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LakePathConfig {
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

impl LakePathConfig {
    pub fn load() -> CommonResult<Self> {
        Self::from_figment(Self::figment())
    }

    /// The configuration layers: the embedded defaults, then the environment.
    pub fn figment() -> Figment {
        Figment::from(Toml::string(DEFAULT_CONFIG)).admerge(
            Env::prefixed(CONFIG_ENV_PREFIX).map(|p| p.as_str().replace("__", ".").into()),
        )
    }

    pub fn from_figment(figment: Figment) -> CommonResult<Self> {
        let config: Self = figment.extract()?;
        if config.scan.batch_size == 0 {
            return Err(CommonError::invalid("scan batch size must be positive"));
        }
        debug!("loaded configuration: {config:?}");
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub ignore_prefixes: Vec<String>,
    pub exclude_invalid_files: bool,
}

/// The number of rows in each record batch produced by a scan, unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 8192;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub batch_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}
