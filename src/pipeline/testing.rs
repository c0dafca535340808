//! Test doubles for the pipeline ports

use crate::domain::ports::{
    DeviceIdentity, DiagnosticFetcher, DiagnosticReport, Notifier, Severity, Transport,
};
use crate::error::{Error, Result};
use crate::hardware::discovery::validate_device_name;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::subscriber::DefaultGuard;

pub fn disk(kname: &str, serial: &str) -> DeviceIdentity {
    DeviceIdentity {
        kname: kname.into(),
        serial: serial.into(),
        transport: if kname.starts_with("nvme") {
            Transport::Nvme
        } else {
            Transport::Sata
        },
        model: "Test Disk".into(),
        rotational: false,
    }
}

pub fn sata_report(power_cycle_count: u64) -> Value {
    json!({
        "device": {"name": "/dev/sda", "type": "sat", "protocol": "ATA"},
        "logical_block_size": 512,
        "power_on_time": {"hours": 27011},
        "power_cycle_count": power_cycle_count,
        "ata_smart_attributes": {
            "table": [
                {"id": 241, "name": "Total_LBAs_Written", "raw": {"value": 1000}},
                {"id": 242, "name": "Total_LBAs_Read", "raw": {"value": 3000}}
            ]
        }
    })
}

pub fn nvme_report(power_cycle_count: u64, data_units_read: u64) -> Value {
    json!({
        "device": {"name": "/dev/nvme0n1", "type": "nvme", "protocol": "NVMe"},
        "logical_block_size": 512,
        "power_on_time": {"hours": 3120},
        "power_cycle_count": power_cycle_count,
        "nvme_smart_health_information_log": {
            "data_units_read": data_units_read,
            "data_units_written": 0
        }
    })
}

enum Scripted {
    Report(Value, i32),
    Failure(Error),
}

/// Fetcher answering from a per-device script; reports can be replaced
/// between passes
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<HashMap<String, Scripted>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report(self, kname: &str, json: Value, exit_code: i32) -> Self {
        self.set_report(kname, json, exit_code);
        self
    }

    pub fn with_error(self, kname: &str, error: Error) -> Self {
        self.script
            .lock()
            .insert(kname.to_string(), Scripted::Failure(error));
        self
    }

    pub fn set_report(&self, kname: &str, json: Value, exit_code: i32) {
        self.script
            .lock()
            .insert(kname.to_string(), Scripted::Report(json, exit_code));
    }
}

#[async_trait]
impl DiagnosticFetcher for ScriptedFetcher {
    async fn fetch(&self, kname: &str) -> Result<DiagnosticReport> {
        validate_device_name(kname)?;

        let mut script = self.script.lock();
        match script.remove(kname) {
            Some(Scripted::Report(json, exit_code)) => {
                script.insert(kname.to_string(), Scripted::Report(json.clone(), exit_code));
                Ok(DiagnosticReport { json, exit_code })
            }
            Some(Scripted::Failure(error)) => Err(error),
            None => Err(Error::ToolInvocation {
                tool: "smartctl".into(),
                device: kname.to_string(),
                reason: "no scripted report".into(),
            }),
        }
    }
}

/// Notifier that records every notification
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Severity)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.sent.lock().iter().filter(|(_, s)| *s == severity).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str, severity: Severity, _timeout_ms: u32) -> Result<()> {
        self.sent.lock().push((message.to_string(), severity));
        if self.fail {
            return Err(Error::ToolInvocation {
                tool: "notify-send".into(),
                device: "desktop".into(),
                reason: "no session bus".into(),
            });
        }
        Ok(())
    }
}

/// Formatted log output collected by [`capture_logs`]
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// The first line mentioning `needle`
    pub fn line_with(&self, needle: &str) -> Option<String> {
        self.contents()
            .lines()
            .find(|line| line.contains(needle))
            .map(str::to_string)
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's log events into a buffer until the guard drops
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();

    (buffer, tracing::subscriber::set_default(subscriber))
}
