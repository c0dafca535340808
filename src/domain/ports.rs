//! Domain Ports - Core types and trait definitions for diskwatcher
//!
//! These traits define the boundaries between the SMART/continuity logic and
//! the outside world (lsblk, smartctl, SQLite, desktop notifications).
//! Adapters implement these traits to provide concrete functionality.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Device Identity
// =============================================================================

/// Transport reported by the block layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Sata,
    Nvme,
    #[serde(untagged)]
    Other(String),
}

impl Transport {
    /// Parse an lsblk TRAN column value
    pub fn from_tran(value: &str) -> Self {
        match value {
            "sata" => Transport::Sata,
            "nvme" => Transport::Nvme,
            other => Transport::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Sata => write!(f, "sata"),
            Transport::Nvme => write!(f, "nvme"),
            Transport::Other(other) => write!(f, "{}", other),
        }
    }
}

/// A block device as seen by the enumerator during one pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Kernel device name (e.g., sda, nvme0n1)
    pub kname: String,
    /// Serial number
    pub serial: String,
    /// Transport type
    pub transport: Transport,
    /// Model string, escapes already decoded
    pub model: String,
    /// Rotational media flag
    pub rotational: bool,
}

impl DeviceIdentity {
    /// Device node path (e.g., /dev/sda)
    pub fn device_path(&self) -> String {
        format!("/dev/{}", self.kname)
    }
}

// =============================================================================
// SMART Samples
// =============================================================================

/// Raw diagnostic output of smartctl for one device
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    /// Parsed `smartctl -j` document
    pub json: serde_json::Value,
    /// Raw process exit status (low 8 bits are a bitmask)
    pub exit_code: i32,
}

/// Comparable counters extracted from a diagnostic report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSample {
    pub power_on_hours: u64,
    pub power_cycle_count: u64,
    pub host_read_bytes: u64,
    pub host_write_bytes: u64,
    /// Decoded smartctl exit status
    pub status: String,
}

/// Serialized body of a stored event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplePayload {
    pub dev: String,
    pub serial: String,
    pub transport: Transport,
    pub model: String,
    #[serde(flatten)]
    pub sample: NormalizedSample,
}

impl SamplePayload {
    pub fn new(device: &DeviceIdentity, sample: NormalizedSample) -> Self {
        Self {
            dev: device.device_path(),
            serial: device.serial.clone(),
            transport: device.transport.clone(),
            model: device.model.clone(),
            sample,
        }
    }
}

// =============================================================================
// Stored Events
// =============================================================================

/// Event to be appended to the store
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub dev: String,
    pub serial: String,
    pub serial_fingerprint: String,
    /// Pass timestamp
    pub dt: DateTime<Utc>,
    /// Host boot timestamp
    pub dt_boot: DateTime<Utc>,
    pub payload: SamplePayload,
}

/// Event as read back from the store
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub id: i64,
    pub dev: String,
    pub serial: String,
    pub serial_fingerprint: String,
    pub dt: DateTime<Utc>,
    pub dt_boot: DateTime<Utc>,
    pub payload: SamplePayload,
}

impl StoredEvent {
    /// The normalized counters carried by this event
    pub fn sample(&self) -> &NormalizedSample {
        &self.payload.sample
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// Notification urgency, following the freedesktop urgency levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Normal,
    Critical,
}

impl Severity {
    /// Icon name shown next to the notification
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Low | Severity::Normal => "drive-harddisk",
            Severity::Critical => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Normal => write!(f, "normal"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

// =============================================================================
// Device Enumerator Port
// =============================================================================

/// Port for listing the block devices of the current host
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    /// List whole-disk devices in enumeration order
    async fn list_devices(&self) -> Result<Vec<DeviceIdentity>>;
}

// =============================================================================
// Diagnostic Fetcher Port
// =============================================================================

/// Port for retrieving a SMART report for one device
#[async_trait]
pub trait DiagnosticFetcher: Send + Sync {
    /// Fetch the report for a kernel device name
    ///
    /// Names outside `^[a-z0-9-_]+$` are rejected before anything runs.
    async fn fetch(&self, kname: &str) -> Result<DiagnosticReport>;
}

// =============================================================================
// Event Store Port
// =============================================================================

/// Port for the append-only event store
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append an event, returning its insertion id
    async fn append(&self, event: &NewEvent) -> Result<i64>;

    /// Up to two most recent events for a fingerprint, newest first
    async fn last_two(&self, serial_fingerprint: &str) -> Result<Vec<StoredEvent>>;
}

// =============================================================================
// Notifier Port
// =============================================================================

/// Port for operator alerts
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification; callers treat failures as non-fatal
    async fn notify(&self, message: &str, severity: Severity, timeout_ms: u32) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_tran() {
        assert_eq!(Transport::from_tran("sata"), Transport::Sata);
        assert_eq!(Transport::from_tran("nvme"), Transport::Nvme);
        assert_eq!(Transport::from_tran("usb"), Transport::Other("usb".into()));
        assert_eq!(Transport::from_tran("usb").to_string(), "usb");
    }

    #[test]
    fn test_payload_serialization() {
        let device = DeviceIdentity {
            kname: "sda".into(),
            serial: "XXX0NF0JB1".into(),
            transport: Transport::Sata,
            model: "Samsung SSD 750 EVO 250GB".into(),
            rotational: false,
        };
        let payload = SamplePayload::new(
            &device,
            NormalizedSample {
                power_on_hours: 1200,
                power_cycle_count: 42,
                host_read_bytes: 1024,
                host_write_bytes: 2048,
                status: "OK".into(),
            },
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["dev"], "/dev/sda");
        assert_eq!(json["transport"], "sata");
        assert_eq!(json["power_cycle_count"], 42);

        let back: SamplePayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_other_transport_serializes_as_string() {
        let json = serde_json::to_value(Transport::Other("usb".into())).unwrap();
        assert_eq!(json, "usb");
        let back: Transport = serde_json::from_value(json).unwrap();
        assert_eq!(back, Transport::Other("usb".into()));
    }

    #[test]
    fn test_severity_icons() {
        assert_eq!(Severity::Critical.icon(), "error");
        assert_eq!(Severity::Normal.icon(), "drive-harddisk");
        assert_eq!(Severity::Low.to_string(), "low");
    }
}
