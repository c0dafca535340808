//! SQLite Event Store
//!
//! Append-only table of SMART samples keyed by serial fingerprint. A single
//! connection with a short busy timeout serializes writers; a database
//! locked by a concurrent pass fails the one statement instead of waiting.

use crate::domain::ports::{EventStore, NewEvent, SamplePayload, StoredEvent};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS disk_event
(
    id_event INTEGER PRIMARY KEY,
    dev TEXT NOT NULL,
    serial TEXT NOT NULL,
    serial_fingerprint TEXT NOT NULL,
    dt TEXT NOT NULL,
    dt_boot TEXT NOT NULL,
    smart_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_disk_event_fingerprint_dt
    ON disk_event(serial_fingerprint, dt, id_event);

CREATE TRIGGER IF NOT EXISTS disk_event_no_update
    BEFORE UPDATE ON disk_event
BEGIN
    SELECT RAISE(ABORT, 'disk_event is append-only');
END;

CREATE TRIGGER IF NOT EXISTS disk_event_no_delete
    BEFORE DELETE ON disk_event
BEGIN
    SELECT RAISE(ABORT, 'disk_event is append-only');
END;
";

/// Row as read from SQLite, before payload and timestamp decoding
struct RawEvent {
    id: i64,
    dev: String,
    serial: String,
    serial_fingerprint: String,
    dt: String,
    dt_boot: String,
    smart_json: String,
}

// =============================================================================
// SQLite Event Store
// =============================================================================

/// Event store backed by a single SQLite connection
pub struct SqliteEventStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteEventStore {
    /// Open or create the store at `path`
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Self::initialize(&conn)?;

        debug!("Event store opened at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an existing store without creating or migrating it
    ///
    /// Appends through a read-only store fail with a database error.
    pub fn open_read_only(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(busy_timeout)?;

        debug!("Event store opened read-only at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create an in-memory store for testing
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn initialize(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Database file, if the store is file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn decode(raw: RawEvent) -> Result<StoredEvent> {
        let payload: SamplePayload = serde_json::from_str(&raw.smart_json).map_err(|e| {
            Error::Storage(format!("corrupt payload in event {}: {}", raw.id, e))
        })?;

        Ok(StoredEvent {
            id: raw.id,
            dev: raw.dev,
            serial: raw.serial,
            serial_fingerprint: raw.serial_fingerprint,
            dt: parse_timestamp(&raw.dt)?,
            dt_boot: parse_timestamp(&raw.dt_boot)?,
            payload,
        })
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn append(&self, event: &NewEvent) -> Result<i64> {
        let smart_json = serde_json::to_string(&event.payload)?;
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO disk_event (dev, serial, serial_fingerprint, dt, dt_boot, smart_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.dev,
                event.serial,
                event.serial_fingerprint,
                format_timestamp(&event.dt),
                format_timestamp(&event.dt_boot),
                smart_json,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn last_two(&self, serial_fingerprint: &str) -> Result<Vec<StoredEvent>> {
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(
                "SELECT id_event, dev, serial, serial_fingerprint, dt, dt_boot, smart_json
                 FROM disk_event
                 WHERE serial_fingerprint = ?1
                 ORDER BY dt DESC, id_event DESC
                 LIMIT 2",
            )?;

            let rows = stmt
                .query_map(params![serial_fingerprint], |row| {
                    Ok(RawEvent {
                        id: row.get(0)?,
                        dev: row.get(1)?,
                        serial: row.get(2)?,
                        serial_fingerprint: row.get(3)?,
                        dt: row.get(4)?,
                        dt_boot: row.get(5)?,
                        smart_json: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        rows.into_iter().map(Self::decode).collect()
    }
}

// Fixed-width UTC timestamps sort lexicographically in time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("invalid timestamp {:?}: {}", value, e)))
}
