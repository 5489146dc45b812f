use std::sync::Mutex;

use anyhow::Result;
use avwx_core::{DecodedRecord, Sink};
use rusqlite::{params, Connection};

use crate::SinkError;

pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                station TEXT,
                decoded_at TEXT NOT NULL,
                json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS records_kind_station ON records (kind, station);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn emit_sync(&self, record: &DecodedRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let decoded_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let conn = self.conn.lock().map_err(|_| SinkError::Poisoned)?;
        let inserted = conn.execute(
            "INSERT INTO records (kind, station, decoded_at, json) VALUES (?1, ?2, ?3, ?4)",
            params![record.kind().as_str(), record.station(), decoded_at, json],
        );
        if let Err(e) = inserted {
            tracing::warn!(error=?e, kind=record.kind().as_str(), "sqlite insert failed");
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sink for SqliteSink {
    async fn emit(&mut self, record: &DecodedRecord) -> Result<()> {
        self.emit_sync(record)
    }
}
