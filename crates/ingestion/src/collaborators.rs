//! Persistence collaborators of the ingester and their storage-backed implementations.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use shot_common::{ChannelKind, ShotResult, StoredRecord};
use storage::{ObjectStorage, RecordCatalog, StoragePath};

/// Looks up a stored record sharing an identity field with an incoming one.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    /// Find a record with the given shot number or timestamp.
    async fn find_stored_record(
        &self,
        shotnum: Option<u64>,
        timestamp: DateTime<Utc>,
    ) -> ShotResult<Option<StoredRecord>>;
}

/// Persists validated records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Store a new record. Fails with `ShotError::RecordExists` if the id is taken.
    async fn insert_record(&self, record: &StoredRecord) -> ShotResult<()>;

    /// Add the channels of `record` to the stored record with the same id.
    async fn merge_channels(&self, record: &StoredRecord) -> ShotResult<()>;
}

/// Reports whether a channel payload is present in object storage.
#[async_trait]
pub trait PayloadProbe: Send + Sync {
    async fn payload_exists(
        &self,
        record_id: &str,
        channel: &str,
        kind: ChannelKind,
    ) -> ShotResult<bool>;
}

/// Writes channel payloads to object storage.
#[async_trait]
pub trait PayloadStore: PayloadProbe {
    async fn put_payload(
        &self,
        record_id: &str,
        channel: &str,
        kind: ChannelKind,
        payload: Bytes,
    ) -> ShotResult<()>;
}

/// Everything the ingester persists records through.
pub trait RecordStore: RecordLookup + RecordSink {}

impl<T: RecordLookup + RecordSink> RecordStore for T {}

#[async_trait]
impl RecordLookup for RecordCatalog {
    async fn find_stored_record(
        &self,
        shotnum: Option<u64>,
        timestamp: DateTime<Utc>,
    ) -> ShotResult<Option<StoredRecord>> {
        self.find_by_identity(shotnum, timestamp).await
    }
}

#[async_trait]
impl RecordSink for RecordCatalog {
    async fn insert_record(&self, record: &StoredRecord) -> ShotResult<()> {
        RecordCatalog::insert_record(self, record).await
    }

    async fn merge_channels(&self, record: &StoredRecord) -> ShotResult<()> {
        RecordCatalog::merge_channels(self, record).await
    }
}

#[async_trait]
impl PayloadProbe for ObjectStorage {
    async fn payload_exists(
        &self,
        record_id: &str,
        channel: &str,
        kind: ChannelKind,
    ) -> ShotResult<bool> {
        self.exists(&StoragePath::channel_payload(kind, record_id, channel))
            .await
    }
}

#[async_trait]
impl PayloadStore for ObjectStorage {
    async fn put_payload(
        &self,
        record_id: &str,
        channel: &str,
        kind: ChannelKind,
        payload: Bytes,
    ) -> ShotResult<()> {
        self.put(
            &StoragePath::channel_payload(kind, record_id, channel),
            payload,
        )
        .await
    }
}
