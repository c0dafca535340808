//! Hardware Discovery Module
//!
//! Enumerates disks, fetches their SMART reports and reads the host boot
//! time on Linux systems.

pub mod boot;
pub mod command;
pub mod scanner;
pub mod smartctl;

pub use boot::boot_time;
pub use scanner::*;
pub use smartctl::*;
