//! Error types for diskwatcher
//!
//! Provides structured error types for the sampling pipeline, the SMART
//! normalizer, the event store and the external tool wrappers.

use thiserror::Error;

/// Unified error type for diskwatcher
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Device name {name:?} contains characters outside [a-z0-9-_]")]
    InvalidDeviceName { name: String },

    #[error("Bit position {bit} is outside the range 0-7")]
    InvalidBitPosition { bit: u32 },

    // =========================================================================
    // Normalization Errors
    // =========================================================================
    #[error("Device {device} is not supported (transport: {transport})")]
    UnsupportedDevice { device: String, transport: String },

    #[error("Diagnostic report is missing field: {field}")]
    MissingField { field: String },

    // =========================================================================
    // External Tool Errors
    // =========================================================================
    #[error("{name} not found under {path}")]
    ToolMissing { name: String, path: String },

    #[error("{tool} failed for {device}: {reason}")]
    ToolInvocation {
        tool: String,
        device: String,
        reason: String,
    },

    #[error("{tool} timed out for {device} after {secs}s")]
    ToolTimeout {
        tool: String,
        device: String,
        secs: u64,
    },

    #[error("Device enumeration failed: {0}")]
    Enumeration(String),

    #[error("Boot time unavailable: {0}")]
    BootTime(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // Parse / IO Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a pass should do when an error surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Expected condition, skip the device and keep going
    SkipDevice,
    /// The single operation is invalid; skip it but report loudly
    FailOperation,
    /// Abort the whole pass with a non-zero exit
    Fatal,
}

impl Error {
    /// Classify this error for the pass driver
    pub fn disposition(&self) -> Disposition {
        match self {
            // Partial or foreign vendor output, tool hiccups on one device
            Error::UnsupportedDevice { .. }
            | Error::MissingField { .. }
            | Error::ToolInvocation { .. }
            | Error::ToolTimeout { .. }
            | Error::JsonParse(_) => Disposition::SkipDevice,

            Error::InvalidDeviceName { .. } | Error::InvalidBitPosition { .. } => {
                Disposition::FailOperation
            }

            Error::ToolMissing { .. }
            | Error::Enumeration(_)
            | Error::BootTime(_)
            | Error::Database(_)
            | Error::Storage(_)
            | Error::Configuration(_)
            | Error::YamlParse(_)
            | Error::Io(_) => Disposition::Fatal,
        }
    }

    /// Check if this error only affects a single device
    pub fn is_device_level(&self) -> bool {
        !matches!(self.disposition(), Disposition::Fatal)
    }

    /// Check if this error describes the device rather than a failed run
    ///
    /// Foreign transports and reports without the needed counters recur on
    /// every pass and are not worth a warning; tool failures are.
    pub fn is_expected_skip(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedDevice { .. } | Error::MissingField { .. }
        )
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Error::MissingField {
            field: field.into(),
        }
    }
}

/// Result type alias for diskwatcher
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_dispositions() {
        let err = Error::UnsupportedDevice {
            device: "sr0".into(),
            transport: "scsi".into(),
        };
        assert_eq!(err.disposition(), Disposition::SkipDevice);

        let err = Error::InvalidDeviceName {
            name: "../sda".into(),
        };
        assert_eq!(err.disposition(), Disposition::FailOperation);

        let err = Error::ToolMissing {
            name: "lsblk".into(),
            path: "/usr/bin/lsblk".into(),
        };
        assert_eq!(err.disposition(), Disposition::Fatal);
    }

    #[test]
    fn test_device_level() {
        assert!(Error::missing("power_cycle_count").is_device_level());
        assert!(Error::missing("power_cycle_count").is_expected_skip());

        let invalid = Error::InvalidBitPosition { bit: 9 };
        assert!(invalid.is_device_level());
        assert!(!invalid.is_expected_skip());

        let timeout = Error::ToolTimeout {
            tool: "smartctl".into(),
            device: "sdb".into(),
            secs: 10,
        };
        assert_eq!(timeout.disposition(), Disposition::SkipDevice);
        assert!(!timeout.is_expected_skip());

        let fatal = Error::Storage("disk full".into());
        assert!(!fatal.is_device_level());
    }

    #[test]
    fn test_messages() {
        let err = Error::ToolMissing {
            name: "smartctl".into(),
            path: "/usr/sbin/smartctl".into(),
        };
        assert_eq!(err.to_string(), "smartctl not found under /usr/sbin/smartctl");
    }
}
