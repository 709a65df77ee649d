//! Channel payload upload utilities.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, error};

use shot_common::ValidatedChannel;

use crate::collaborators::PayloadStore;

/// JSON document holding the bulk data of a channel.
///
/// Scalars keep their value in the record itself and have no payload.
pub fn encode_payload(channel: &ValidatedChannel) -> Option<serde_json::Result<Bytes>> {
    let document = match channel {
        ValidatedChannel::Scalar(_) => return None,
        ValidatedChannel::Image(c) => json!({ "pixels": c.pixels }),
        ValidatedChannel::FloatImage(c) => json!({ "pixels": c.pixels }),
        ValidatedChannel::Waveform(c) => json!({ "x": c.x, "y": c.y }),
        ValidatedChannel::Vector(c) => json!({ "data": c.data }),
    };
    Some(serde_json::to_vec(&document).map(Bytes::from))
}

/// Upload the payloads of `channels` with at most `concurrency` in flight.
///
/// # Returns
/// Names of the channels whose payload could not be stored
pub async fn upload_payloads<S>(
    store: &S,
    record_id: &str,
    channels: &BTreeMap<String, ValidatedChannel>,
    concurrency: usize,
) -> Vec<String>
where
    S: PayloadStore + ?Sized,
{
    let uploads: Vec<_> = channels
        .iter()
        .filter_map(|(name, channel)| {
            encode_payload(channel).map(|payload| async move {
                let result = match payload {
                    Ok(bytes) => {
                        let size = bytes.len();
                        store
                            .put_payload(record_id, name, channel.kind(), bytes)
                            .await
                            .map(|_| size)
                            .map_err(|e| e.to_string())
                    }
                    Err(e) => Err(e.to_string()),
                };
                (name, result)
            })
        })
        .collect();

    let results: Vec<_> = stream::iter(uploads)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut failed = Vec::new();
    for (name, result) in results {
        match result {
            Ok(size) => debug!(record_id = %record_id, channel = %name, size, "Uploaded payload"),
            Err(e) => {
                error!(
                    record_id = %record_id,
                    channel = %name,
                    error = %e,
                    "Payload upload failed"
                );
                failed.push(name.clone());
            }
        }
    }
    failed.sort();
    failed
}
