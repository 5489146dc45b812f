use std::collections::VecDeque;

use anyhow::Result;
use avwx_core::{DecodedRecord, RecordQuery, RecordStore, Sink};
use tokio::sync::RwLock;

use crate::SinkError;

/// Bounded in-memory history; the oldest record is dropped once full
pub struct MemoryStore {
    capacity: usize,
    records: RwLock<VecDeque<DecodedRecord>>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Result<Self, SinkError> {
        if capacity == 0 {
            return Err(SinkError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            records: RwLock::new(VecDeque::new()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn store(&self, record: DecodedRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<DecodedRecord>> {
        let records = self.records.read().await;
        let mut hits: Vec<DecodedRecord> = records
            .iter()
            .rev()
            .filter(|r| query.matches(r))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        hits.reverse();
        Ok(hits)
    }
}

#[async_trait::async_trait]
impl Sink for MemoryStore {
    async fn emit(&mut self, record: &DecodedRecord) -> Result<()> {
        self.store(record.clone()).await
    }
}
