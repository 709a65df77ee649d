//! Storage abstractions for shot-gateway services.
//!
//! Provides unified interfaces for:
//! - Object storage (MinIO/S3) for image, waveform and vector payloads
//! - PostgreSQL for the record catalog

pub mod catalog;
pub mod object_store;

pub use self::object_store::{ObjectStorage, ObjectStorageConfig, StoragePath};
pub use catalog::RecordCatalog;
