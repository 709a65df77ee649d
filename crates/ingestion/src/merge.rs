//! Reconciliation of an incoming record with an already stored one.
//!
//! The identity of a record is its `(shotnum, timestamp)` pair. An incoming
//! record either starts a new stored record, adds channels to the stored
//! record it matches, or is rejected because the two disagree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info};

use shot_common::{RecordMetadata, ShotResult, StoredRecord, ValidatedChannel};

use crate::collaborators::PayloadProbe;
use crate::error::RejectRecordError;
use crate::outcome::IngestOutcome;

pub const ALREADY_PRESENT: &str = "Channel is already present in existing record";
pub const INCONSISTENT_METADATA: &str = "inconsistent metadata";
pub const TIMESTAMP_CONFLICT: &str = "timestamp matches, other metadata does not";
pub const SHOTNUM_CONFLICT: &str = "shotnum matches, other metadata does not";

/// How an accepted record relates to the stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeDecision {
    /// No matching record; the record is stored as new
    AcceptNew,
    /// Same shot as the stored record; new channels are added to it
    AcceptMerge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShotnumMatch {
    Equal,
    BothAbsent,
    Different,
    OneSided,
}

fn compare_shotnums(incoming: Option<u64>, stored: Option<u64>) -> ShotnumMatch {
    match (incoming, stored) {
        (Some(a), Some(b)) if a == b => ShotnumMatch::Equal,
        (Some(_), Some(_)) => ShotnumMatch::Different,
        (None, None) => ShotnumMatch::BothAbsent,
        _ => ShotnumMatch::OneSided,
    }
}

/// Decide how `incoming` relates to the record returned by the identity lookup.
pub fn reconcile(
    incoming: &RecordMetadata,
    stored: Option<&StoredRecord>,
) -> Result<MergeDecision, RejectRecordError> {
    let Some(stored) = stored else {
        return Ok(MergeDecision::AcceptNew);
    };
    let existing = &stored.metadata;

    let same_timestamp = incoming.timestamp == existing.timestamp;
    let shotnums = compare_shotnums(incoming.shotnum, existing.shotnum);

    match (same_timestamp, shotnums) {
        (true, ShotnumMatch::Equal | ShotnumMatch::BothAbsent) => {
            if secondary_metadata_matches(incoming, existing) {
                info!(record_id = %stored.id, "Record metadata matches stored record");
                Ok(MergeDecision::AcceptMerge)
            } else {
                error!(
                    record_id = %stored.id,
                    incoming = ?incoming,
                    stored = ?existing,
                    "Record identity matches but metadata is inconsistent"
                );
                Err(RejectRecordError::new(INCONSISTENT_METADATA))
            }
        }
        (true, _) => Err(RejectRecordError::new(TIMESTAMP_CONFLICT)),
        (false, ShotnumMatch::Equal) => Err(RejectRecordError::new(SHOTNUM_CONFLICT)),
        (false, _) => Ok(MergeDecision::AcceptNew),
    }
}

fn secondary_metadata_matches(incoming: &RecordMetadata, stored: &RecordMetadata) -> bool {
    incoming.active_area == stored.active_area
        && incoming.active_experiment == stored.active_experiment
        && incoming.epac_ops_data_version == stored.epac_ops_data_version
}

/// Split channels that passed the channel checks into those to add to
/// `stored` and those already present in it.
///
/// A stored channel whose payload is missing from object storage is accepted
/// again so that a failed upload can be retried. Accepted and rejected
/// channels are recorded in `outcome`.
pub async fn merge_channels<P>(
    stored: &StoredRecord,
    incoming: BTreeMap<String, ValidatedChannel>,
    probe: &P,
    outcome: &mut IngestOutcome,
) -> ShotResult<BTreeMap<String, ValidatedChannel>>
where
    P: PayloadProbe + ?Sized,
{
    let mut accepted = BTreeMap::new();

    for (name, channel) in incoming {
        let retry = match stored.channel_kind(&name) {
            None => true,
            Some(kind) if kind.has_external_payload() => {
                let present = probe.payload_exists(&stored.id, &name, kind).await?;
                if !present {
                    info!(
                        record_id = %stored.id,
                        channel = %name,
                        "Stored channel has no payload, accepting it again"
                    );
                }
                !present
            }
            Some(_) => false,
        };

        if retry {
            outcome.accept(&name);
            accepted.insert(name, channel);
        } else {
            outcome.reject(&name, ALREADY_PRESENT);
        }
    }

    Ok(accepted)
}
