//! Watcher Configuration
//!
//! A single immutable configuration value built at startup from defaults,
//! an optional YAML file and command-line overrides, then shared by
//! reference with every component.

use crate::continuity::RegressionPolicy;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const DATABASE_FILE: &str = "dbc.db";
const TRACE_FILE: &str = "diskinfo";

// =============================================================================
// Configuration
// =============================================================================

/// Runtime configuration for sampling and continuity passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatcherConfig {
    /// Directory holding the event database and the trace file
    pub data_dir: PathBuf,
    /// smartctl binary
    pub smartctl_path: PathBuf,
    /// lsblk binary
    pub lsblk_path: PathBuf,
    /// notify-send binary
    pub notify_send_path: PathBuf,
    /// Deliver desktop notifications at all
    pub notifications: bool,
    /// Also notify on consistent (OK) verdicts
    pub always_notify: bool,
    /// Notification expiry in milliseconds
    pub notify_timeout_ms: u32,
    /// Per-device limit for external tool runs
    pub tool_timeout_secs: u64,
    /// SQLite busy timeout
    pub db_busy_timeout_ms: u64,
    /// Classification of backwards-moving power-cycle counters
    pub counter_regression: RegressionPolicy,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/diskwatcher"),
            smartctl_path: PathBuf::from("/usr/sbin/smartctl"),
            lsblk_path: PathBuf::from("/usr/bin/lsblk"),
            notify_send_path: PathBuf::from("/usr/bin/notify-send"),
            notifications: true,
            always_notify: false,
            notify_timeout_ms: 10_000,
            tool_timeout_secs: 10,
            db_busy_timeout_ms: 1_000,
            counter_regression: RegressionPolicy::Tampered,
        }
    }
}

impl WatcherConfig {
    /// Load configuration from an optional YAML file
    ///
    /// Fields absent from the file keep their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                let text = fs::read_to_string(path).map_err(|e| {
                    Error::Configuration(format!("cannot read {}: {}", path.display(), e))
                })?;
                serde_yaml::from_str(&text)?
            }
            None => Self::default(),
        };

        Ok(config)
    }

    /// Reject values no pass can run with
    pub fn validate(&self) -> Result<()> {
        if !self.data_dir.is_absolute() {
            return Err(Error::Configuration(format!(
                "data_dir must be an absolute path, got {}",
                self.data_dir.display()
            )));
        }

        if self.tool_timeout_secs == 0 {
            return Err(Error::Configuration(
                "tool_timeout_secs must be greater than zero".into(),
            ));
        }

        if self.db_busy_timeout_ms == 0 {
            return Err(Error::Configuration(
                "db_busy_timeout_ms must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Check required binaries and create the data directory
    pub fn ensure_runtime(&self) -> Result<()> {
        for (name, path) in [("smartctl", &self.smartctl_path), ("lsblk", &self.lsblk_path)] {
            if !path.exists() {
                return Err(Error::ToolMissing {
                    name: name.to_string(),
                    path: path.display().to_string(),
                });
            }
        }

        create_data_dir(&self.data_dir)
    }

    /// Path of the SQLite event database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    /// Path of the append-only trace file
    pub fn trace_path(&self) -> PathBuf {
        self.data_dir.join(TRACE_FILE)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn db_busy_timeout(&self) -> Duration {
        Duration::from_millis(self.db_busy_timeout_ms)
    }
}

#[cfg(unix)]
fn create_data_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(dir)
        .map_err(Error::from)
}

#[cfg(not(unix))]
fn create_data_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(Error::from)
}
