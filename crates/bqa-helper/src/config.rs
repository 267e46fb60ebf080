//! Helper configuration
//!
//! JSON-backed settings for which model to load and how delegates are picked.

use std::fs;
use std::path::{Path, PathBuf};

use bqa_delegate::{DelegatePolicy, DeviceCapabilities, DEFAULT_CPU_THREADS, NNAPI_MIN_PLATFORM_VERSION};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::helper::BERT_QA_MODEL;

/// Upper bound on CPU inference threads.
const MAX_CPU_THREADS: u32 = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperConfig {
    /// File name of the bundled model inside `assets_dir`
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Directory holding bundled model files
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    /// Threads used when falling back to CPU inference
    #[serde(default = "default_cpu_threads")]
    pub cpu_num_threads: u32,
    /// Lowest platform API level allowed to use NNAPI
    #[serde(default = "default_nnapi_min_platform_version")]
    pub nnapi_min_platform_version: u32,
    /// Pinned device capabilities; probe the host when absent
    #[serde(default)]
    pub device: Option<DeviceCapabilities>,
}

fn default_model_name() -> String {
    BERT_QA_MODEL.to_string()
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("./assets")
}

fn default_cpu_threads() -> u32 {
    DEFAULT_CPU_THREADS
}

fn default_nnapi_min_platform_version() -> u32 {
    NNAPI_MIN_PLATFORM_VERSION
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            assets_dir: default_assets_dir(),
            cpu_num_threads: default_cpu_threads(),
            nnapi_min_platform_version: default_nnapi_min_platform_version(),
            device: None,
        }
    }
}

impl HelperConfig {
    /// Bring out-of-range values back to something loadable.
    pub fn validate(&mut self) {
        if self.model_name.trim().is_empty() {
            tracing::warn!("Empty model name in config, using {}", BERT_QA_MODEL);
            self.model_name = default_model_name();
        }

        if self.cpu_num_threads == 0 {
            self.cpu_num_threads = DEFAULT_CPU_THREADS;
        } else if self.cpu_num_threads > MAX_CPU_THREADS {
            tracing::warn!(
                "cpu_num_threads {} too large, capping to {}",
                self.cpu_num_threads,
                MAX_CPU_THREADS
            );
            self.cpu_num_threads = MAX_CPU_THREADS;
        }
    }

    pub fn policy(&self) -> DelegatePolicy {
        let mut policy = DelegatePolicy {
            nnapi_min_platform_version: self.nnapi_min_platform_version,
            cpu_num_threads: self.cpu_num_threads,
        };
        policy.validate();
        policy
    }
}

/// Load config from disk
///
/// Returns the default config if the file doesn't exist or is corrupted
pub fn load_config(path: &Path) -> HelperConfig {
    match load_config_strict(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            HelperConfig::default()
        }
    }
}

/// Load and validate config, propagating IO and parse errors
pub fn load_config_strict(path: &Path) -> Result<HelperConfig, ConfigError> {
    let json = fs::read_to_string(path)?;
    let mut config: HelperConfig = serde_json::from_str(&json)?;
    config.validate();

    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Save config to disk
pub fn save_config(path: &Path, config: &HelperConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;

    tracing::debug!("Saved config to {}", path.display());
    Ok(())
}
