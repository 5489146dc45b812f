use anyhow::Result;

use crate::{DecodedRecord, RecordKind};

/// Write-only consumer of decoded records
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    async fn emit(&mut self, record: &DecodedRecord) -> Result<()>;
}

/// Filter for [`RecordStore::query`]; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub kind: Option<RecordKind>,
    pub station: Option<String>,
    /// Most recent N matches
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn matches(&self, record: &DecodedRecord) -> bool {
        if let Some(kind) = self.kind {
            if record.kind() != kind {
                return false;
            }
        }
        match self.station.as_deref() {
            Some(station) => record.station() == Some(station),
            None => true,
        }
    }
}

/// Store/query contract used by persistence collaborators
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn store(&self, record: DecodedRecord) -> Result<()>;

    /// Matching records, oldest first
    async fn query(&self, query: &RecordQuery) -> Result<Vec<DecodedRecord>>;
}
