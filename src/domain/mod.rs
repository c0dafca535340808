//! Domain Module
//!
//! Core domain types and the collaborator ports the sampling and
//! continuity passes are written against.

pub mod ports;

pub use ports::*;

use sha2::{Digest, Sha256};

/// Content hash of a serial number, used as the store's lookup key
pub fn serial_fingerprint(serial: &str) -> String {
    hex::encode(Sha256::digest(serial.as_bytes()))
}
