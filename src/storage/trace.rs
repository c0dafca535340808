//! Forensic Trace File
//!
//! Flat, append-only text log of every stored sample, one comma-separated
//! line per event. It survives independently of the database and can be
//! replayed by hand.

use crate::domain::ports::NewEvent;
use crate::error::Result;
use chrono::SecondsFormat;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only trace file
pub struct TraceFile {
    path: PathBuf,
}

impl TraceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line for `event`
    pub async fn append(&self, event: &NewEvent) -> Result<()> {
        let line = format_line(event)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

/// `dev,serial,transport,model,dt_boot,smart_json` terminated by a newline
pub fn format_line(event: &NewEvent) -> Result<String> {
    let payload = &event.payload;
    let smart_json = serde_json::to_string(&payload.sample)?;

    Ok(format!(
        "{},{},{},{},{},{}\n",
        payload.dev,
        payload.serial,
        payload.transport,
        payload.model,
        event.dt_boot.to_rfc3339_opts(SecondsFormat::Secs, true),
        smart_json
    ))
}
