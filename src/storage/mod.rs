//! Storage Module
//!
//! Persistence for SMART samples: the SQLite event store the continuity
//! check reads from, and the flat trace file kept alongside it.

mod sqlite;
mod trace;

pub use sqlite::SqliteEventStore;
pub use trace::{format_line, TraceFile};
