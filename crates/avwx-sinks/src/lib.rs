use anyhow::Result;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use avwx_core::{DecodedRecord, Sink};

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("memory store capacity must be at least 1")]
    ZeroCapacity,
    #[error("store lock poisoned")]
    Poisoned,
}

/// Appends one JSON line per record to `<dir>/records.jsonl`
pub struct FsSink {
    file: PathBuf,
}

impl FsSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        create_dir_all(dir)?;
        let file = dir.join("records.jsonl");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)?;
        f.write_all(line.as_bytes())?;
        f.write_all(b"\n")
    }
}

#[async_trait::async_trait]
impl Sink for FsSink {
    async fn emit(&mut self, record: &DecodedRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        if let Err(e) = self.append_line(&line) {
            tracing::warn!(error=?e, path=%self.file.display(), kind=record.kind().as_str(), "jsonl write failed");
            return Err(e.into());
        }
        Ok(())
    }
}
