//! Record-level checks: timestamp, active area, active experiment, shot number.

use shot_common::{parse_timestamp, RawRecord, RecordMetadata};
use tracing::debug;

use crate::coerce;
use crate::config::VERSION_ATTRIBUTE;
use crate::error::RejectRecordError;

const KNOWN_ATTRIBUTES: [&str; 5] = [
    VERSION_ATTRIBUTE,
    "timestamp",
    "shotnum",
    "active_area",
    "active_experiment",
];

/// Validate the record metadata of `raw`.
///
/// `version` is the marker already accepted by the file checks. Checks
/// short-circuit in the order timestamp, active area, active experiment,
/// shot number.
pub fn check_record(raw: &RawRecord, version: &str) -> Result<RecordMetadata, RejectRecordError> {
    let timestamp = match raw.attribute("timestamp") {
        None => return Err(RejectRecordError::new("timestamp is missing")),
        Some(value) => coerce::to_string("timestamp", value)
            .map_err(|_| RejectRecordError::new("timestamp has wrong datatype. Expected string"))?,
    };
    let timestamp = parse_timestamp(&timestamp).map_err(|e| {
        debug!(error = %e, "Unparseable record timestamp");
        RejectRecordError::new("timestamp is not a valid ISO-8601 datetime")
    })?;

    let active_area = match raw.attribute("active_area") {
        None => return Err(RejectRecordError::new("active_area is missing")),
        Some(value) => coerce::to_string("active_area", value).map_err(|_| {
            RejectRecordError::new("active_area has wrong datatype. Expected string")
        })?,
    };

    let active_experiment = raw
        .attribute("active_experiment")
        .map(|value| coerce::to_string("active_experiment", value))
        .transpose()
        .map_err(|_| {
            RejectRecordError::new("active_experiment has wrong datatype. Expected string")
        })?;

    let shotnum = raw
        .attribute("shotnum")
        .map(|value| coerce::to_u64("shotnum", value))
        .transpose()
        .map_err(|_| RejectRecordError::new("shotnum has wrong datatype. Expected integer"))?;

    for key in raw.attributes.keys() {
        if !KNOWN_ATTRIBUTES.contains(&key.as_str()) {
            debug!(attribute = %key, "Ignoring unrecognised record attribute");
        }
    }

    Ok(RecordMetadata {
        epac_ops_data_version: version.to_string(),
        timestamp,
        shotnum,
        active_area,
        active_experiment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shot_common::RawValue;

    fn valid_record() -> RawRecord {
        let mut record = RawRecord::default();
        let attrs = &mut record.attributes;
        attrs.insert(VERSION_ATTRIBUTE.into(), RawValue::string("1.0"));
        attrs.insert("timestamp".into(), RawValue::string("2023-06-05T08:03:00"));
        attrs.insert("shotnum".into(), RawValue::uint(366_372));
        attrs.insert("active_area".into(), RawValue::string("ea1"));
        attrs.insert("active_experiment".into(), RawValue::string("90097341"));
        record
    }

    fn reject(record: &RawRecord) -> String {
        check_record(record, "1.0")
            .unwrap_err()
            .reason()
            .to_string()
    }

    #[test]
    fn test_valid_record() {
        let metadata = check_record(&valid_record(), "1.0").unwrap();
        assert_eq!(metadata.record_id(), "20230605080300");
        assert_eq!(metadata.shotnum, Some(366_372));
        assert_eq!(metadata.active_area, "ea1");
        assert_eq!(metadata.active_experiment.as_deref(), Some("90097341"));
        assert_eq!(metadata.epac_ops_data_version, "1.0");
    }

    #[test]
    fn test_optional_fields_absent() {
        let mut record = valid_record();
        record.attributes.remove("shotnum");
        record.attributes.remove("active_experiment");
        let metadata = check_record(&record, "1.0").unwrap();
        assert_eq!(metadata.shotnum, None);
        assert_eq!(metadata.active_experiment, None);
    }

    #[test]
    fn test_timestamp_checks() {
        let mut record = valid_record();
        record.attributes.remove("timestamp");
        assert_eq!(reject(&record), "timestamp is missing");

        record
            .attributes
            .insert("timestamp".into(), RawValue::int(1_685_952_180));
        assert_eq!(
            reject(&record),
            "timestamp has wrong datatype. Expected string"
        );

        record
            .attributes
            .insert("timestamp".into(), RawValue::string("yesterday"));
        assert_eq!(
            reject(&record),
            "timestamp is not a valid ISO-8601 datetime"
        );
    }

    #[test]
    fn test_active_area_checks() {
        let mut record = valid_record();
        record.attributes.remove("active_area");
        assert_eq!(reject(&record), "active_area is missing");

        record
            .attributes
            .insert("active_area".into(), RawValue::int(1));
        assert_eq!(
            reject(&record),
            "active_area has wrong datatype. Expected string"
        );
    }

    #[test]
    fn test_active_experiment_type() {
        let mut record = valid_record();
        record
            .attributes
            .insert("active_experiment".into(), RawValue::uint(90_097_341));
        assert_eq!(
            reject(&record),
            "active_experiment has wrong datatype. Expected string"
        );
    }

    #[test]
    fn test_shotnum_type() {
        let mut record = valid_record();
        record
            .attributes
            .insert("shotnum".into(), RawValue::float(366_372.0));
        assert_eq!(
            reject(&record),
            "shotnum has wrong datatype. Expected integer"
        );

        record
            .attributes
            .insert("shotnum".into(), RawValue::int(-4));
        assert_eq!(
            reject(&record),
            "shotnum has wrong datatype. Expected integer"
        );

        record
            .attributes
            .insert("shotnum".into(), RawValue::int(12));
        assert_eq!(check_record(&record, "1.0").unwrap().shotnum, Some(12));
    }

    #[test]
    fn test_check_order_short_circuits() {
        let mut record = valid_record();
        record.attributes.remove("active_area");
        record
            .attributes
            .insert("shotnum".into(), RawValue::string("bad"));
        assert_eq!(reject(&record), "active_area is missing");
    }

    #[test]
    fn test_unknown_attributes_are_ignored() {
        let mut record = valid_record();
        record
            .attributes
            .insert("operator".into(), RawValue::string("jd"));
        assert!(check_record(&record, "1.0").is_ok());
    }
}
