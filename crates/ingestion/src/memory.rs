//! Process-local record store for dry runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use shot_common::{ShotError, ShotResult, StoredRecord};

use crate::collaborators::{RecordLookup, RecordSink};

/// Records keyed by record id, with the same semantics as the catalog:
/// inserts never replace a record and merges never overwrite a stored channel.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<String, StoredRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with existing records.
    pub fn with_records(records: impl IntoIterator<Item = StoredRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn get(&self, record_id: &str) -> Option<StoredRecord> {
        self.records.read().await.get(record_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordLookup for InMemoryRecordStore {
    async fn find_stored_record(
        &self,
        shotnum: Option<u64>,
        timestamp: DateTime<Utc>,
    ) -> ShotResult<Option<StoredRecord>> {
        let records = self.records.read().await;

        let by_timestamp = records
            .values()
            .find(|record| record.metadata.timestamp == timestamp);
        let found = by_timestamp.or_else(|| {
            shotnum.and_then(|shotnum| {
                records
                    .values()
                    .find(|record| record.metadata.shotnum == Some(shotnum))
            })
        });

        Ok(found.cloned())
    }
}

#[async_trait]
impl RecordSink for InMemoryRecordStore {
    async fn insert_record(&self, record: &StoredRecord) -> ShotResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(ShotError::RecordExists(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        debug!(record_id = %record.id, "Stored record in memory");
        Ok(())
    }

    async fn merge_channels(&self, record: &StoredRecord) -> ShotResult<()> {
        let mut records = self.records.write().await;
        let existing = records
            .get_mut(&record.id)
            .ok_or_else(|| ShotError::RecordNotFound(record.id.clone()))?;
        merge_into(existing, record);
        Ok(())
    }
}

fn merge_into(existing: &mut StoredRecord, incoming: &StoredRecord) {
    for (name, channel) in &incoming.channels {
        existing
            .channels
            .entry(name.clone())
            .or_insert_with(|| channel.clone());
    }
}
