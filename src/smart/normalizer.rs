//! SMART Attribute Normalizer
//!
//! Reduces a `smartctl -a -j` document to the counters diskwatcher compares
//! over time: power-on hours, power-cycle count and host bytes read/written.
//!
//! Power counters always come from the top-level `power_cycle_count` and
//! `power_on_time.hours` fields. NVMe drives fall back to the same counters
//! in the health log when smartctl omits the top-level copies.

use crate::domain::ports::{DiagnosticReport, NormalizedSample};
use crate::error::{Error, Result};
use crate::smart::conversion::{first_match, AtaAttribute, Category};
use crate::smart::exit_status;
use serde_json::Value;

const NVME_HEALTH_LOG: &str = "nvme_smart_health_information_log";

/// NVMe data units are reported in thousands of logical blocks
const NVME_DATA_UNIT_BLOCKS: u64 = 1000;

// =============================================================================
// Transport Dispatch
// =============================================================================

/// Report shapes the normalizer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Nvme,
    Ata,
}

impl ReportKind {
    /// Classify a report by its `device.type` discriminator
    pub fn detect(report: &Value) -> Result<Self> {
        let device_type = report["device"]["type"]
            .as_str()
            .ok_or_else(|| Error::missing("device.type"))?;

        match device_type {
            "nvme" => Ok(ReportKind::Nvme),
            "ata" | "sat" | "sata" => Ok(ReportKind::Ata),
            other => Err(Error::UnsupportedDevice {
                device: report["device"]["name"]
                    .as_str()
                    .unwrap_or("unknown")
                    .to_string(),
                transport: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalize a fetched report, attaching its decoded exit status
pub fn normalize(report: &DiagnosticReport) -> Result<NormalizedSample> {
    normalize_value(&report.json, exit_status::decode(report.exit_code))
}

/// Normalize a parsed smartctl document
///
/// Fails with `UnsupportedDevice` for transports other than NVMe and the
/// ATA family, and with `MissingField` when a required field is absent.
/// No partial sample is produced on failure.
pub fn normalize_value(report: &Value, status: String) -> Result<NormalizedSample> {
    let kind = ReportKind::detect(report)?;
    let logical_block_size = require_u64(report, &["logical_block_size"])?;

    let (power_on_hours, power_cycle_count) = power_counters(report, kind)?;

    let (host_read_bytes, host_write_bytes) = match kind {
        ReportKind::Nvme => nvme_bytes(report, logical_block_size)?,
        ReportKind::Ata => ata_bytes(report, logical_block_size),
    };

    Ok(NormalizedSample {
        power_on_hours,
        power_cycle_count,
        host_read_bytes,
        host_write_bytes,
        status,
    })
}

fn power_counters(report: &Value, kind: ReportKind) -> Result<(u64, u64)> {
    let health = &report[NVME_HEALTH_LOG];

    let hours = match (report["power_on_time"]["hours"].as_u64(), kind) {
        (Some(hours), _) => hours,
        (None, ReportKind::Nvme) => health["power_on_hours"]
            .as_u64()
            .ok_or_else(|| Error::missing("power_on_time.hours"))?,
        (None, ReportKind::Ata) => return Err(Error::missing("power_on_time.hours")),
    };

    let cycles = match (report["power_cycle_count"].as_u64(), kind) {
        (Some(cycles), _) => cycles,
        (None, ReportKind::Nvme) => health["power_cycles"]
            .as_u64()
            .ok_or_else(|| Error::missing("power_cycle_count"))?,
        (None, ReportKind::Ata) => return Err(Error::missing("power_cycle_count")),
    };

    Ok((hours, cycles))
}

fn nvme_bytes(report: &Value, logical_block_size: u64) -> Result<(u64, u64)> {
    let unit_bytes = logical_block_size.saturating_mul(NVME_DATA_UNIT_BLOCKS);

    let read = require_u64(report, &[NVME_HEALTH_LOG, "data_units_read"])?;
    let written = require_u64(report, &[NVME_HEALTH_LOG, "data_units_written"])?;

    Ok((
        read.saturating_mul(unit_bytes),
        written.saturating_mul(unit_bytes),
    ))
}

fn ata_bytes(report: &Value, logical_block_size: u64) -> (u64, u64) {
    let attributes = ata_attributes(report);

    let read = first_match(Category::Read, &attributes, logical_block_size).unwrap_or(0);
    let write = first_match(Category::Write, &attributes, logical_block_size).unwrap_or(0);

    (read, write)
}

/// Named attributes of `ata_smart_attributes.table`, in report order
///
/// Rows without a name or a numeric raw value are dropped.
pub fn ata_attributes(report: &Value) -> Vec<AtaAttribute> {
    report["ata_smart_attributes"]["table"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let name = row["name"].as_str()?;
                    let raw = row["raw"]["value"].as_u64()?;
                    Some(AtaAttribute::new(name, raw))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn require_u64(report: &Value, path: &[&str]) -> Result<u64> {
    path.iter()
        .fold(report, |node, key| &node[*key])
        .as_u64()
        .ok_or_else(|| Error::missing(path.join(".")))
}
