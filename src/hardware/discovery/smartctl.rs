//! smartctl Diagnostics
//!
//! Retrieves SMART reports for SATA and NVMe devices using smartctl from
//! smartmontools in JSON mode.

use crate::domain::ports::{DiagnosticFetcher, DiagnosticReport};
use crate::error::{Error, Result};
use crate::hardware::discovery::command::run_tool;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

// =============================================================================
// Device Name Validation
// =============================================================================

/// Check a kernel device name against `^[a-z0-9-_]+$`
pub fn validate_device_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidDeviceName {
            name: name.to_string(),
        })
    }
}

// =============================================================================
// smartctl Fetcher
// =============================================================================

/// Fetches `smartctl -a -j` reports
pub struct SmartctlFetcher {
    smartctl_path: PathBuf,
    timeout: Duration,
}

impl SmartctlFetcher {
    pub fn new(smartctl_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            smartctl_path: smartctl_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DiagnosticFetcher for SmartctlFetcher {
    async fn fetch(&self, kname: &str) -> Result<DiagnosticReport> {
        validate_device_name(kname)?;

        // Sleeping drives are woken up; -n standby is not passed.
        let device_path = format!("/dev/{}", kname);
        let output = run_tool(
            "smartctl",
            &self.smartctl_path,
            &["-a", "-j", device_path.as_str()],
            kname,
            self.timeout,
        )
        .await?;

        // smartctl returns non-zero for device conditions; the JSON is
        // still emitted and the code is decoded separately.
        let exit_code = output.status.code().ok_or_else(|| Error::ToolInvocation {
            tool: "smartctl".into(),
            device: kname.to_string(),
            reason: "terminated by signal".into(),
        })?;

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        debug!(device = kname, exit_code, "smartctl report received");

        Ok(DiagnosticReport { json, exit_code })
    }
}
