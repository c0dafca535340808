//! Hardware Module
//!
//! Adapters between the host's block devices and the domain ports.

pub mod discovery;

pub use discovery::*;
