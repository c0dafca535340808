//! Host Boot Time
//!
//! Every stored sample carries the boot time of the host that took it, so
//! a reviewer can line up drive power cycles with host restarts.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fs;
use std::path::Path;

const PROC_STAT: &str = "/proc/stat";
const PROC_UPTIME: &str = "/proc/uptime";

/// Boot time of the running host
pub fn boot_time() -> Result<DateTime<Utc>> {
    boot_time_from(Path::new(PROC_STAT), Path::new(PROC_UPTIME), Utc::now())
}

/// Boot time from a `stat` file, falling back to `now - uptime`
pub fn boot_time_from(stat: &Path, uptime: &Path, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if let Some(btime) = fs::read_to_string(stat)
        .ok()
        .and_then(|text| parse_btime(&text))
    {
        return Utc
            .timestamp_opt(btime, 0)
            .single()
            .ok_or_else(|| Error::BootTime(format!("btime {} out of range", btime)));
    }

    let text = fs::read_to_string(uptime)
        .map_err(|e| Error::BootTime(format!("{}: {}", uptime.display(), e)))?;
    let secs = parse_uptime(&text)
        .ok_or_else(|| Error::BootTime(format!("cannot parse {}", uptime.display())))?;

    Ok(now - Duration::milliseconds((secs * 1000.0) as i64))
}

/// Seconds since epoch from the `btime` line of /proc/stat
pub fn parse_btime(stat: &str) -> Option<i64> {
    stat.lines()
        .find_map(|line| line.strip_prefix("btime "))
        .and_then(|value| value.trim().parse().ok())
}

/// Uptime in seconds from the first field of /proc/uptime
pub fn parse_uptime(uptime: &str) -> Option<f64> {
    uptime
        .split_whitespace()
        .next()
        .and_then(|value| value.parse().ok())
        .filter(|secs: &f64| secs.is_finite() && *secs >= 0.0)
}
