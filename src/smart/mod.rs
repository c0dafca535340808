//! SMART Module
//!
//! Turns smartctl output into comparable counters: exit status decoding,
//! vendor attribute unit conversion, and per-transport normalization.

pub mod conversion;
pub mod exit_status;
pub mod normalizer;

pub use conversion::{AtaAttribute, Category, ConversionKind};
pub use exit_status::{decode as decode_exit_status, ExitFlag};
pub use normalizer::{normalize, normalize_value, ReportKind};
