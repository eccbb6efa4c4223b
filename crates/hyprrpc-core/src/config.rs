//! Config - ループの周期と eviction の設定
//!
//! `<config_dir>/hyprrpc/config.toml` から読み込みます。ファイルが無ければ既定値。
//!
//! ```toml
//! scan_period_ms = 1000
//! inc_splice = 5
//! max_rpc_timeout = 3
//! updater_interval_secs = 5
//! grace_policy = "countdown"
//! liveness = "process"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::endangered::GracePolicy;

pub const RPC_PERIODIC_SCAN_MS: u64 = 1000;
pub const INC_SPLICE: u32 = 5;
pub const MAX_RPC_TIMEOUT: i32 = 3;
pub const APP_UPDATER_INTERVAL: u64 = 5;
pub const SOURCE_TIMEOUT_MS: u64 = 2000;

const CONFIG_DIR_NAME: &str = "hyprrpc";
const CONFIG_FILE_NAME: &str = "config.toml";

/// sweep で「生きている」をどう判定するか
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessCheck {
    /// pid に対応するプロセスがあるか
    #[default]
    Process,
    /// address が fresh snapshot に残っているか
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub scan_period_ms: u64,
    pub inc_splice: u32,
    pub max_rpc_timeout: i32,
    pub updater_interval_secs: u64,
    pub source_timeout_ms: u64,
    pub grace_policy: GracePolicy,
    pub liveness: LivenessCheck,
    /// Window class the CLI selects for presence on startup.
    pub select_class: Option<String>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            scan_period_ms: RPC_PERIODIC_SCAN_MS,
            inc_splice: INC_SPLICE,
            max_rpc_timeout: MAX_RPC_TIMEOUT,
            updater_interval_secs: APP_UPDATER_INTERVAL,
            source_timeout_ms: SOURCE_TIMEOUT_MS,
            grace_policy: GracePolicy::default(),
            liveness: LivenessCheck::default(),
            select_class: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config directory not found")]
    NoConfigDir,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ManagerConfig {
    pub fn scan_period(&self) -> Duration {
        Duration::from_millis(self.scan_period_ms)
    }

    /// One sleep increment of the reconciliation cycle.
    pub fn scan_slice(&self) -> Duration {
        self.scan_period() / self.inc_splice.max(1)
    }

    pub fn updater_interval(&self) -> Duration {
        Duration::from_secs(self.updater_interval_secs)
    }

    /// One sleep increment of the updater cycle.
    pub fn updater_slice(&self) -> Duration {
        self.updater_interval() / self.inc_splice.max(1)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads `path` (or the default location). A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }
}
