//! smartctl Exit Status
//!
//! smartctl reports device conditions through a bitmask in the low byte of
//! its exit status. This module turns that bitmask into readable flags.

use crate::error::{Error, Result};

/// One condition bit of the smartctl exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitFlag {
    ParameterError,
    DeviceOpenFailed,
    CommandFailed,
    DiskFailing,
    PrefailBelowThreshold,
    PrefailBelowThresholdInPast,
    ErrorLogNotEmpty,
    SelfTestLogErrors,
}

impl ExitFlag {
    /// All flags in bit order (bit 0 first)
    pub const ALL: [ExitFlag; 8] = [
        ExitFlag::ParameterError,
        ExitFlag::DeviceOpenFailed,
        ExitFlag::CommandFailed,
        ExitFlag::DiskFailing,
        ExitFlag::PrefailBelowThreshold,
        ExitFlag::PrefailBelowThresholdInPast,
        ExitFlag::ErrorLogNotEmpty,
        ExitFlag::SelfTestLogErrors,
    ];

    /// Flag for a bit position, 0-7
    pub fn from_bit(bit: u32) -> Result<Self> {
        usize::try_from(bit)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or(Error::InvalidBitPosition { bit })
    }

    /// Bit position of this flag
    pub fn bit(&self) -> u32 {
        *self as u32
    }

    /// Whether this flag is set in an exit code
    pub fn is_set(&self, exit_code: i32) -> bool {
        exit_code & (1 << self.bit()) != 0
    }

    pub fn message(&self) -> &'static str {
        match self {
            ExitFlag::ParameterError => "smartctl parameter error",
            ExitFlag::DeviceOpenFailed => "device cannot be opened",
            ExitFlag::CommandFailed => "smart/ata cmd fail or checksum error",
            ExitFlag::DiskFailing => "disk failing",
            ExitFlag::PrefailBelowThreshold => "prefail attributes below threshold",
            ExitFlag::PrefailBelowThresholdInPast => {
                "usage/prefail attributes were below threshold in the past"
            }
            ExitFlag::ErrorLogNotEmpty => "error log not empty",
            ExitFlag::SelfTestLogErrors => "self test log has errors",
        }
    }
}

/// Flags set in the low byte of an exit code, in ascending bit order
pub fn flags(exit_code: i32) -> Vec<ExitFlag> {
    ExitFlag::ALL
        .iter()
        .copied()
        .filter(|flag| flag.is_set(exit_code))
        .collect()
}

/// Decode a smartctl exit code into a status string
///
/// Returns `"OK"` when no condition bit is set, otherwise the messages of
/// the set bits joined with `", "`.
pub fn decode(exit_code: i32) -> String {
    if exit_code & 0xFF == 0 {
        return "OK".to_string();
    }

    flags(exit_code)
        .iter()
        .map(ExitFlag::message)
        .collect::<Vec<_>>()
        .join(", ")
}
