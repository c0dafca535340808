//! Continuity Module
//!
//! Decides whether successive SMART samples of a drive are consistent with
//! the host's own restarts.

pub mod evaluator;

pub use evaluator::*;
