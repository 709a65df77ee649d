//! Main Ingester struct for shot records.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use shot_common::{RawRecord, ShotError, StoredRecord, ValidatedRecord};
use storage::StoragePath;

use crate::channel_checks::{check_channels, ChannelResult};
use crate::collaborators::{PayloadStore, RecordStore};
use crate::config::IngestConfig;
use crate::error::{IngestionError, RejectRecordError, Result};
use crate::file_checks::check_file;
use crate::manifest::ChannelManifest;
use crate::merge::{merge_channels, reconcile, MergeDecision};
use crate::outcome::{IngestOutcome, SubmitResponse};
use crate::record_checks::check_record;
use crate::upload::upload_payloads;

pub const UPLOAD_FAILED: &str = "Upload to object storage failed";
pub const RECORD_ID_TAKEN: &str = "record id is already used by another record";

/// Result of validating and reconciling one record.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub record_id: String,
    pub decision: MergeDecision,
    /// The record restricted to its accepted channels
    pub record: ValidatedRecord,
    pub outcome: IngestOutcome,
}

/// Result of an ingest that was persisted.
#[derive(Debug, Clone)]
pub struct IngestionResult {
    pub record_id: String,
    pub decision: MergeDecision,
    /// `Added as <id>` or `Updated <id>`
    pub message: String,
    pub outcome: IngestOutcome,
}

impl IngestionResult {
    pub fn into_response(self) -> SubmitResponse {
        SubmitResponse {
            message: self.message,
            response: self.outcome,
        }
    }
}

/// Core ingester for shot records.
///
/// Runs the file, record and channel checks, reconciles the record with
/// what is already stored, and optionally persists the result.
pub struct Ingester {
    manifest: Arc<dyn ChannelManifest>,
    records: Arc<dyn RecordStore>,
    payloads: Arc<dyn PayloadStore>,
    config: IngestConfig,
}

impl Ingester {
    /// Create a new Ingester.
    pub fn new(
        manifest: Arc<dyn ChannelManifest>,
        records: Arc<dyn RecordStore>,
        payloads: Arc<dyn PayloadStore>,
        config: IngestConfig,
    ) -> Self {
        Self {
            manifest,
            records,
            payloads,
            config,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Validate `raw` and decide per channel whether it is accepted.
    ///
    /// Nothing is written. File and record rejections abort before any
    /// channel is checked; an identity conflict with a stored record aborts
    /// after the channel checks.
    pub async fn ingest(&self, raw: &RawRecord) -> Result<IngestReport> {
        let file = check_file(raw, &self.config.version_policy)?;
        let metadata = check_record(raw, &file.version)?;
        let record_id = metadata.record_id();

        info!(
            record_id = %record_id,
            shotnum = ?metadata.shotnum,
            channels = raw.channels.len(),
            "Checking record"
        );

        let mut outcome = IngestOutcome::with_warnings(file.warnings);
        let mut passed = BTreeMap::new();
        for (name, result) in check_channels(&raw.channels, self.manifest.as_ref()) {
            match result {
                ChannelResult::Accepted(channel) => {
                    passed.insert(name, channel);
                }
                ChannelResult::Rejected(reasons) => outcome.reject_all(&name, reasons),
            }
        }

        let stored = self
            .records
            .find_stored_record(metadata.shotnum, metadata.timestamp)
            .await
            .map_err(IngestionError::catalog)?;

        let decision = reconcile(&metadata, stored.as_ref()).map_err(|e| {
            warn!(record_id = %record_id, reason = %e, "Record rejected");
            e
        })?;

        let channels = match (decision, stored.as_ref()) {
            (MergeDecision::AcceptMerge, Some(stored)) => {
                merge_channels(stored, passed, self.payloads.as_ref(), &mut outcome)
                    .await
                    .map_err(IngestionError::storage)?
            }
            _ => {
                for name in passed.keys() {
                    outcome.accept(name);
                }
                passed
            }
        };

        info!(
            record_id = %record_id,
            decision = ?decision,
            accepted = outcome.accepted_channels.len(),
            rejected = outcome.rejected_channels.len(),
            "Record checked"
        );

        Ok(IngestReport {
            record_id,
            decision,
            record: ValidatedRecord { metadata, channels },
            outcome,
        })
    }

    /// Validate `raw`, upload its payloads and persist the record.
    ///
    /// A new record is inserted before any payload is written, holding only
    /// the channels without an external payload. If its id is already taken
    /// the ingest is rejected and nothing is uploaded. Channels whose payload
    /// upload fails are moved to the rejected set and left out of the
    /// persisted record.
    pub async fn ingest_and_store(&self, raw: &RawRecord) -> Result<IngestionResult> {
        let IngestReport {
            record_id,
            decision,
            mut record,
            mut outcome,
        } = self.ingest(raw).await?;

        if decision == MergeDecision::AcceptNew {
            let inline = ValidatedRecord {
                metadata: record.metadata.clone(),
                channels: record
                    .channels
                    .iter()
                    .filter(|(_, channel)| !channel.kind().has_external_payload())
                    .map(|(name, channel)| (name.clone(), channel.clone()))
                    .collect(),
            };
            self.insert(&record_id, &inline).await?;
            record
                .channels
                .retain(|_, channel| channel.kind().has_external_payload());
        }

        let failed = upload_payloads(
            self.payloads.as_ref(),
            &record_id,
            &record.channels,
            self.config.upload_concurrency,
        )
        .await;
        for name in &failed {
            record.channels.remove(name);
            outcome.reject(name, UPLOAD_FAILED);
        }

        if decision == MergeDecision::AcceptMerge || !record.channels.is_empty() {
            let stored = to_stored(&record_id, &record);
            self.records
                .merge_channels(&stored)
                .await
                .map_err(IngestionError::catalog)?;
        }

        let message = match decision {
            MergeDecision::AcceptNew => format!("Added as {}", record_id),
            MergeDecision::AcceptMerge => format!("Updated {}", record_id),
        };

        info!(
            record_id = %record_id,
            decision = ?decision,
            accepted = outcome.accepted_channels.len(),
            failed_uploads = failed.len(),
            "Record stored"
        );

        Ok(IngestionResult {
            record_id,
            decision,
            message,
            outcome,
        })
    }

    async fn insert(&self, record_id: &str, record: &ValidatedRecord) -> Result<()> {
        let stored = to_stored(record_id, record);
        match self.records.insert_record(&stored).await {
            Ok(()) => Ok(()),
            Err(ShotError::RecordExists(_)) => {
                warn!(record_id = %record_id, "Record id already taken");
                Err(RejectRecordError::new(RECORD_ID_TAKEN).into())
            }
            Err(e) => Err(IngestionError::catalog(e)),
        }
    }
}

fn to_stored(record_id: &str, record: &ValidatedRecord) -> StoredRecord {
    StoredRecord::from_validated(record, |name, kind| {
        StoragePath::channel_payload(kind, record_id, name)
    })
}
