//! Object storage interface for channel payloads (MinIO/S3 compatible).

use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, memory::InMemory, path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use shot_common::{ChannelKind, ShotError, ShotResult};

/// Configuration for object storage connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// S3/MinIO endpoint URL
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO)
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            bucket: "shot-data".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

/// Object storage client for channel payloads.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStorage {
    /// Create a new object storage client from config.
    pub fn new(config: &ObjectStorageConfig) -> ShotResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region);

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| ShotError::StorageError(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }

    /// Process-local store, used for dry runs and tests.
    pub fn in_memory(bucket: &str) -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            bucket: bucket.to_string(),
        }
    }

    /// Write bytes to a path in the bucket.
    #[instrument(skip(self, data), fields(bucket = %self.bucket, path = %path))]
    pub async fn put(&self, path: &str, data: Bytes) -> ShotResult<()> {
        let location = Path::from(path);
        debug!(size = data.len(), "Writing object");

        self.store
            .put(&location, data.into())
            .await
            .map_err(|e| ShotError::StorageError(format!("Failed to write {}: {}", path, e)))?;

        Ok(())
    }

    /// Read bytes from a path.
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    pub async fn get(&self, path: &str) -> ShotResult<Bytes> {
        let location = Path::from(path);

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| ShotError::StorageError(format!("Failed to read {}: {}", path, e)))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| ShotError::StorageError(format!("Failed to read bytes: {}", e)))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    /// Check if an object exists.
    pub async fn exists(&self, path: &str) -> ShotResult<bool> {
        let location = Path::from(path);

        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(ShotError::StorageError(format!(
                "Failed to check {}: {}",
                path, e
            ))),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Path builder for consistent storage layout.
pub struct StoragePath;

impl StoragePath {
    /// Top-level prefix for payloads of a channel kind.
    pub fn prefix(kind: ChannelKind) -> &'static str {
        match kind {
            ChannelKind::Scalar => "scalars",
            ChannelKind::Image => "images",
            ChannelKind::FloatImage => "float_images",
            ChannelKind::Waveform => "waveforms",
            ChannelKind::Vector => "vectors",
        }
    }

    /// Build path for a channel payload.
    /// Format: {prefix}/{record_id}/{channel}.json
    pub fn channel_payload(kind: ChannelKind, record_id: &str, channel: &str) -> String {
        format!("{}/{}/{}.json", Self::prefix(kind), record_id, channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_paths() {
        assert_eq!(
            StoragePath::channel_payload(ChannelKind::Image, "20230605080300", "PM-201-FE-CAM-1"),
            "images/20230605080300/PM-201-FE-CAM-1.json"
        );
        assert_eq!(
            StoragePath::channel_payload(ChannelKind::Waveform, "20230605080300", "TRACE"),
            "waveforms/20230605080300/TRACE.json"
        );
    }

    #[tokio::test]
    async fn test_in_memory_put_exists_get() {
        let storage = ObjectStorage::in_memory("test");
        let path = StoragePath::channel_payload(ChannelKind::Vector, "20230605080300", "SPEC");

        assert!(!storage.exists(&path).await.unwrap());
        storage.put(&path, Bytes::from_static(b"[1.0,2.0]")).await.unwrap();
        assert!(storage.exists(&path).await.unwrap());
        assert_eq!(storage.get(&path).await.unwrap(), Bytes::from_static(b"[1.0,2.0]"));
        assert_eq!(storage.bucket(), "test");
    }
}
