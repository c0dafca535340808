//! Sampling Pass
//!
//! Fetches and normalizes a SMART report for every enumerated device and
//! appends the result to the trace file and the event store.

use crate::domain::ports::{
    DeviceIdentity, DiagnosticFetcher, EventStore, NewEvent, NormalizedSample, SamplePayload,
};
use crate::domain::serial_fingerprint;
use crate::error::{Disposition, Error, Result};
use crate::smart::normalize;
use crate::storage::TraceFile;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

// =============================================================================
// Outcomes
// =============================================================================

/// What happened to one device during a sampling pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// A sample was stored under the given event id
    Stored { device: String, event_id: i64 },
    /// The device was skipped; the pass went on
    Skipped { device: String, reason: String },
}

impl PersistOutcome {
    pub fn device(&self) -> &str {
        match self {
            PersistOutcome::Stored { device, .. } => device,
            PersistOutcome::Skipped { device, .. } => device,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, PersistOutcome::Stored { .. })
    }
}

// =============================================================================
// Sampler
// =============================================================================

/// Runs sampling passes against a fetcher and a store
pub struct Sampler {
    fetcher: Arc<dyn DiagnosticFetcher>,
    store: Arc<dyn EventStore>,
    trace: TraceFile,
    boot_time: DateTime<Utc>,
}

impl Sampler {
    pub fn new(
        fetcher: Arc<dyn DiagnosticFetcher>,
        store: Arc<dyn EventStore>,
        trace: TraceFile,
        boot_time: DateTime<Utc>,
    ) -> Self {
        Self {
            fetcher,
            store,
            trace,
            boot_time,
        }
    }

    /// Sample every device once, stamped with the current time
    pub async fn run_pass(&self, devices: &[DeviceIdentity]) -> Result<Vec<PersistOutcome>> {
        self.run_pass_at(devices, Utc::now()).await
    }

    /// Sample every device once, stamped with `now`
    ///
    /// Device-level failures become `Skipped` outcomes. Store, trace-file
    /// and missing-tool failures abort the pass.
    pub async fn run_pass_at(
        &self,
        devices: &[DeviceIdentity],
        now: DateTime<Utc>,
    ) -> Result<Vec<PersistOutcome>> {
        let mut outcomes = Vec::with_capacity(devices.len());

        for device in devices {
            let outcome = match self.sample_device(device).await {
                Ok(Some(sample)) => self.persist(device, sample, now).await?,
                Ok(None) => PersistOutcome::Skipped {
                    device: device.kname.clone(),
                    reason: "no serial number".into(),
                },
                Err(e) if e.is_device_level() => {
                    log_skip(device, &e);
                    PersistOutcome::Skipped {
                        device: device.kname.clone(),
                        reason: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };
            outcomes.push(outcome);
        }

        let stored = outcomes.iter().filter(|o| o.is_stored()).count();
        info!(
            "Sampling pass complete: {} stored, {} skipped",
            stored,
            outcomes.len() - stored
        );

        Ok(outcomes)
    }

    async fn sample_device(&self, device: &DeviceIdentity) -> Result<Option<NormalizedSample>> {
        // Without a serial there is nothing to key the history on.
        if device.serial.is_empty() {
            debug!(device = %device.kname, "No serial number, skipping");
            return Ok(None);
        }

        let report = self.fetcher.fetch(&device.kname).await?;
        normalize(&report).map(Some)
    }

    async fn persist(
        &self,
        device: &DeviceIdentity,
        sample: NormalizedSample,
        now: DateTime<Utc>,
    ) -> Result<PersistOutcome> {
        let event = NewEvent {
            dev: device.device_path(),
            serial: device.serial.clone(),
            serial_fingerprint: serial_fingerprint(&device.serial),
            dt: now,
            dt_boot: self.boot_time,
            payload: SamplePayload::new(device, sample),
        };

        self.trace.append(&event).await?;

        info!(
            "Disk found: {} {} ({}/{}) {}",
            event.dev,
            event.serial,
            device.transport,
            device.model,
            serde_json::to_string(&event.payload.sample)?
        );

        let event_id = self.store.append(&event).await?;

        Ok(PersistOutcome::Stored {
            device: device.kname.clone(),
            event_id,
        })
    }
}

fn log_skip(device: &DeviceIdentity, e: &Error) {
    match e {
        Error::UnsupportedDevice { .. } => {
            debug!(device = %device.kname, "Skipping device: {}", e);
        }
        _ if e.is_expected_skip() => {
            info!(device = %device.kname, "Skipping device: {}", e);
        }
        _ if e.disposition() == Disposition::FailOperation => {
            error!(device = %device.kname, "Failed to process SMART: {}", e);
        }
        _ => {
            warn!(device = %device.kname, "Skipping device: {}", e);
        }
    }
}
