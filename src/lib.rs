//! diskwatcher - SMART power-cycle continuity auditing
//!
//! Periodically samples SMART telemetry of the local drives and flags drives
//! whose power-cycle counter moved in a way the host's own restarts cannot
//! explain: the drive was swapped, powered in another machine, or lost power
//! more than once between samples.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          diskwatcher CLI                             │
//! │            sample  ·  check  ·  devices  ·  history                  │
//! ├──────────────────────────────────┬───────────────────────────────────┤
//! │         Sampling Pass            │          Continuity Pass          │
//! │  lsblk ─► smartctl ─► normalize  │   last two samples ─► evaluate    │
//! │          │                       │          │                        │
//! │          ▼                       │          ▼                        │
//! │   trace file + event store ──────┼──► log + desktop notification     │
//! ├──────────────────────────────────┴───────────────────────────────────┤
//! │   SMART: exit-status decoding · unit conversion · normalization      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`smart`]: smartctl report normalization
//! - [`continuity`]: power-cycle continuity evaluation
//! - [`pipeline`]: sampling and continuity pass drivers
//! - [`hardware`]: lsblk, smartctl and boot time adapters
//! - [`storage`]: SQLite event store and trace file
//! - [`notify`]: desktop notifications
//! - [`domain`]: core types and ports
//! - [`config`]: runtime configuration
//! - [`error`]: error types and handling

pub mod config;
pub mod continuity;
pub mod domain;
pub mod error;
pub mod hardware;
pub mod notify;
pub mod pipeline;
pub mod smart;
pub mod storage;

// Re-export commonly used types
pub use config::WatcherConfig;

pub use continuity::{
    evaluate, Classification, ContinuityVerdict, RegressionPolicy, VerdictReason,
};

pub use domain::ports::{
    DeviceEnumerator, DeviceIdentity, DiagnosticFetcher, DiagnosticReport, EventStore, NewEvent,
    NormalizedSample, Notifier, SamplePayload, Severity, StoredEvent, Transport,
};
pub use domain::serial_fingerprint;

pub use error::{Disposition, Error, Result};

pub use hardware::{LsblkScanner, SmartctlFetcher};

pub use notify::{DesktopNotifier, NullNotifier};

pub use pipeline::{CheckOutcome, CheckSettings, ContinuityChecker, PersistOutcome, Sampler};

pub use storage::{SqliteEventStore, TraceFile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
