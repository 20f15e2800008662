use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::job::RepoType;
use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let max_delay = Duration::from_secs(self.max_delay_secs);
        // NaN becomes 0 through `max`; infinite or out-of-range values fall back to the cap.
        let base_delay = Duration::try_from_secs_f64(self.base_delay_secs.max(0.0))
            .unwrap_or(max_delay)
            .min(max_delay);
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }
}

/// Global configuration loaded from `~/.config/storageface/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFaceConfig {
    /// Hub base URL.
    pub endpoint: String,
    /// Default number of upload worker threads.
    pub threads: usize,
    /// Repository type used when `--repo-type` is not given.
    pub repo_type: RepoType,
    /// Create missing repositories as private.
    pub private: bool,
    /// Glob patterns (relative to the uploaded folder) that are never uploaded.
    pub ignore_patterns: Vec<String>,
    /// Connect timeout for hub requests, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Largest file uploaded, in MiB. Files are committed inline, so each
    /// worker holds about 2.3x this much memory at peak.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_max_file_size_mb() -> u64 {
    100
}

impl Default for StorageFaceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://huggingface.co".to_string(),
            threads: 5,
            repo_type: RepoType::Dataset,
            private: false,
            ignore_patterns: vec!["**/.DS_Store".to_string(), "**/.git/**".to_string()],
            connect_timeout_secs: default_connect_timeout(),
            max_file_size_mb: default_max_file_size_mb(),
            retry: None,
        }
    }
}

impl StorageFaceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("storageface")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<StorageFaceConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = StorageFaceConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: StorageFaceConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
