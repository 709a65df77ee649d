//! Tests for the ingester HTTP wire format.
//!
//! The server module is private to the ingester binary, so these tests cover
//! the request and response documents through the library types they are
//! built from.

use serde_json::json;

use ingestion::{IngestOutcome, Rejection, SubmitResponse};
use shot_common::{ArrayData, RawRecord, RawValue};

// ============================================================================
// Request documents
// ============================================================================

#[test]
fn test_submit_request_deserialization() {
    let body = json!({
        "attributes": {
            "epac_ops_data_version": {"type": "string", "value": "1.0"},
            "timestamp": {"type": "string", "value": "2023-06-05T08:03:00"},
            "shotnum": {"type": "uint", "value": 366372, "bits": 64},
            "active_area": {"type": "string", "value": "ea1"}
        },
        "channels": {
            "PM-201-FE-CAM-1": {
                "attributes": {
                    "channel_dtype": {"type": "string", "value": "image"},
                    "gain": {"type": "float", "value": 5.5, "bits": 32}
                },
                "payloads": {
                    "data": {"type": "array", "shape": [1, 2], "data": {"u8": [1, 2]}}
                }
            }
        }
    });

    let record: RawRecord = serde_json::from_value(body).unwrap();
    assert_eq!(
        record.attribute("shotnum"),
        Some(&RawValue::UInt {
            value: 366_372,
            bits: 64
        })
    );

    let channel = &record.channels["PM-201-FE-CAM-1"];
    assert_eq!(
        channel.attribute("gain"),
        Some(&RawValue::Float {
            value: 5.5,
            bits: 32
        })
    );
    assert_eq!(
        channel.payload("data"),
        Some(&RawValue::array(vec![1, 2], ArrayData::U8(vec![1, 2])))
    );
}

#[test]
fn test_submit_request_defaults() {
    let record: RawRecord = serde_json::from_str("{}").unwrap();
    assert!(record.attributes.is_empty());
    assert!(record.channels.is_empty());
}

// ============================================================================
// Response documents
// ============================================================================

#[test]
fn test_submit_response_serialization() {
    let mut outcome = IngestOutcome::with_warnings(vec![
        "File minor version number too high (expected <=0)".to_string(),
    ]);
    outcome.accept("PM-201-FE-CAM-1");
    outcome.reject("PM-201-TJ-EM", "Channel is already present in existing record");
    outcome.reject_all(
        "PM-201-HJ-PD",
        vec![
            "x attribute is missing".to_string(),
            "y attribute is missing".to_string(),
        ],
    );

    let response = SubmitResponse {
        message: "Updated 20230605080300".to_string(),
        response: outcome,
    };

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "message": "Updated 20230605080300",
            "response": {
                "accepted_channels": ["PM-201-FE-CAM-1"],
                "rejected_channels": {
                    "PM-201-HJ-PD": ["x attribute is missing", "y attribute is missing"],
                    "PM-201-TJ-EM": "Channel is already present in existing record"
                },
                "warnings": ["File minor version number too high (expected <=0)"]
            }
        })
    );
}

#[test]
fn test_rejection_deserialization() {
    let single: Rejection = serde_json::from_value(json!("reason")).unwrap();
    assert_eq!(single, Rejection::Single("reason".to_string()));

    let many: Rejection = serde_json::from_value(json!(["a", "b"])).unwrap();
    assert_eq!(many.reasons(), vec!["a", "b"]);
}
