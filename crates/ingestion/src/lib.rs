//! Shot record ingestion library.
//!
//! Validates a parsed shot file and decides, channel by channel, whether its
//! data is accepted, rejected, or merged into an already stored record.
//!
//! # Architecture
//!
//! Checks run in a fixed order and the first two are fatal for the whole
//! ingest:
//!
//! - file checks: the `epac_ops_data_version` marker
//! - record checks: timestamp, active area, active experiment, shot number
//! - channel checks: manifest lookup and per-kind layout, in parallel
//! - merge reconciliation against the stored record with the same identity
//!
//! Persistence goes through the collaborator traits in [`collaborators`],
//! implemented for the PostgreSQL catalog and object storage of the
//! `storage` crate and for an in-memory store.

pub mod channel_checks;
pub mod coerce;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod file_checks;
mod ingester;
pub mod manifest;
pub mod memory;
pub mod merge;
pub mod outcome;
pub mod record_checks;
pub mod upload;

// Re-exports
pub use channel_checks::{check_channel, check_channels, ChannelResult};
pub use coerce::{coerce, CoercionError, Expected, Mismatch, TypedValue};
pub use collaborators::{PayloadProbe, PayloadStore, RecordLookup, RecordSink, RecordStore};
pub use config::{IngestConfig, VersionPolicy, VERSION_ATTRIBUTE};
pub use error::{IngestionError, RejectFileError, RejectRecordError, Result};
pub use file_checks::{check_file, FileReport};
pub use ingester::{IngestReport, Ingester, IngestionResult, RECORD_ID_TAKEN, UPLOAD_FAILED};
pub use manifest::{ChannelManifest, ManifestEntry, ManifestFile};
pub use memory::InMemoryRecordStore;
pub use merge::{merge_channels, reconcile, MergeDecision};
pub use outcome::{IngestOutcome, Rejection, SubmitResponse};
pub use record_checks::check_record;
