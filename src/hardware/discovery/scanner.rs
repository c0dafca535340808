//! Block Device Scanner
//!
//! Enumerates whole-disk block devices with lsblk in raw mode and turns
//! each row into a [`DeviceIdentity`].

use crate::domain::ports::{DeviceEnumerator, DeviceIdentity, Transport};
use crate::error::{Error, Result};
use crate::hardware::discovery::command::run_tool;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

// =============================================================================
// Constants
// =============================================================================

const LSBLK_COLUMNS: [&str; 5] = ["KNAME", "SERIAL", "TRAN", "MODEL", "ROTA"];

// =============================================================================
// lsblk Scanner
// =============================================================================

/// Lists disks of the local host through lsblk
pub struct LsblkScanner {
    lsblk_path: PathBuf,
    timeout: Duration,
}

impl LsblkScanner {
    /// Create a new scanner
    pub fn new(lsblk_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            lsblk_path: lsblk_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DeviceEnumerator for LsblkScanner {
    async fn list_devices(&self) -> Result<Vec<DeviceIdentity>> {
        let columns = LSBLK_COLUMNS.join(",");
        let output = run_tool(
            "lsblk",
            &self.lsblk_path,
            &["-Arndio", columns.as_str()],
            "host",
            self.timeout,
        )
        .await
        .map_err(|e| match e {
            Error::ToolMissing { .. } => e,
            other => Error::Enumeration(other.to_string()),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Enumeration(format!(
                "lsblk exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let devices = parse_lsblk(&String::from_utf8_lossy(&output.stdout));
        info!("Found {} block devices", devices.len());
        Ok(devices)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse `lsblk -r` output with the KNAME,SERIAL,TRAN,MODEL,ROTA columns
///
/// Raw mode separates columns with a single space and escapes spaces inside
/// values, so empty columns show up as empty fields.
pub fn parse_lsblk(output: &str) -> Vec<DeviceIdentity> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(' ').collect();
            if fields.len() != LSBLK_COLUMNS.len() {
                warn!("Skipping malformed lsblk row: {:?}", line);
                return None;
            }

            let kname = decode_escapes(fields[0]);
            if kname.is_empty() {
                return None;
            }

            let device = DeviceIdentity {
                kname,
                serial: decode_escapes(fields[1]),
                transport: Transport::from_tran(&decode_escapes(fields[2])),
                model: decode_escapes(fields[3]),
                rotational: fields[4] == "1",
            };
            debug!("Enumerated {:?}", device);
            Some(device)
        })
        .collect()
}

/// Decode lsblk `\xNN` escapes
///
/// Escaped bytes are reassembled before UTF-8 decoding so multi-byte
/// characters survive; malformed escapes are kept literally.
pub fn decode_escapes(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'x') {
            let decoded = bytes
                .get(i + 2..i + 4)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}
