//! Common test fixtures for shot-gateway tests.
//!
//! This module provides pre-defined raw records, channels and manifests
//! that represent common ingest scenarios.

use shot_common::{ArrayData, ChannelKind, RawChannel, RawRecord, RawValue};
use std::io::Write;
use tempfile::NamedTempFile;

use crate::generators::{
    create_float_image, create_spectrum, create_test_image, create_trace, raw_matrix, raw_series,
};

/// Record metadata used by [`RecordBuilder::new`].
pub mod shot {
    pub const VERSION: &str = "1.0";
    pub const TIMESTAMP: &str = "2023-06-05T08:03:00";
    /// Record id derived from [`TIMESTAMP`]
    pub const RECORD_ID: &str = "20230605080300";
    pub const SHOTNUM: u64 = 366_372;
    pub const ACTIVE_AREA: &str = "ea1";
    pub const ACTIVE_EXPERIMENT: &str = "90097341";
}

/// Channel names used by [`sample_record`] and [`sample_manifest_entries`].
pub mod channels {
    pub const SCALAR: &str = "PM-201-TJ-EM";
    pub const IMAGE: &str = "PM-201-FE-CAM-1";
    pub const FLOAT_IMAGE: &str = "PM-201-FE-CAM-2-FLOAT";
    pub const WAVEFORM: &str = "PM-201-HJ-PD";
    pub const VECTOR: &str = "PM-201-SPEC";
    /// In the manifest, never in the sample record
    pub const SPARE_SCALAR: &str = "PM-201-TJ-CAM-2-CENX";
}

pub fn scalar_channel(value: f64) -> RawChannel {
    RawChannel::new()
        .with_attribute("channel_dtype", RawValue::string("scalar"))
        .with_attribute("units", RawValue::string("mJ"))
        .with_payload("data", RawValue::float(value))
}

pub fn image_channel(width: usize, height: usize) -> RawChannel {
    RawChannel::new()
        .with_attribute("channel_dtype", RawValue::string("image"))
        .with_attribute("exposure_time_s", RawValue::float(0.001))
        .with_attribute("gain", RawValue::float(5.5))
        .with_attribute("x_pixel_size", RawValue::float(441.0))
        .with_attribute("x_pixel_units", RawValue::string("µm"))
        .with_attribute("y_pixel_size", RawValue::float(441.0))
        .with_attribute("y_pixel_units", RawValue::string("µm"))
        .with_payload(
            "data",
            raw_matrix(height, width, ArrayData::U16(create_test_image(width, height))),
        )
}

pub fn float_image_channel(width: usize, height: usize) -> RawChannel {
    RawChannel::new()
        .with_attribute("channel_dtype", RawValue::string("float_image"))
        .with_payload(
            "data",
            raw_matrix(height, width, ArrayData::F32(create_float_image(width, height))),
        )
}

pub fn waveform_channel(samples: usize) -> RawChannel {
    let (x, y) = create_trace(samples);
    RawChannel::new()
        .with_attribute("channel_dtype", RawValue::string("waveform"))
        .with_attribute("x_units", RawValue::string("ns"))
        .with_attribute("y_units", RawValue::string("V"))
        .with_payload("x", raw_series(x))
        .with_payload("y", raw_series(y))
}

pub fn vector_channel(bins: usize) -> RawChannel {
    RawChannel::new()
        .with_attribute("channel_dtype", RawValue::string("vector"))
        .with_attribute("units", RawValue::string("counts"))
        .with_payload("data", raw_series(create_spectrum(bins)))
}

/// Builder for raw records, starting from valid metadata and no channels.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: RawRecord,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self {
            record: RawRecord::default(),
        }
        .attribute("epac_ops_data_version", RawValue::string(shot::VERSION))
        .attribute("timestamp", RawValue::string(shot::TIMESTAMP))
        .attribute("shotnum", RawValue::uint(shot::SHOTNUM))
        .attribute("active_area", RawValue::string(shot::ACTIVE_AREA))
        .attribute(
            "active_experiment",
            RawValue::string(shot::ACTIVE_EXPERIMENT),
        )
    }

    pub fn attribute(mut self, key: &str, value: RawValue) -> Self {
        self.record.attributes.insert(key.to_string(), value);
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.record.attributes.remove(key);
        self
    }

    pub fn version(self, version: &str) -> Self {
        self.attribute("epac_ops_data_version", RawValue::string(version))
    }

    pub fn timestamp(self, timestamp: &str) -> Self {
        self.attribute("timestamp", RawValue::string(timestamp))
    }

    pub fn shotnum(self, shotnum: Option<u64>) -> Self {
        match shotnum {
            Some(shotnum) => self.attribute("shotnum", RawValue::uint(shotnum)),
            None => self.without("shotnum"),
        }
    }

    pub fn channel(mut self, name: &str, channel: RawChannel) -> Self {
        self.record.channels.insert(name.to_string(), channel);
        self
    }

    pub fn build(self) -> RawRecord {
        self.record
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A valid record with one channel of every kind.
pub fn sample_record() -> RawRecord {
    RecordBuilder::new()
        .channel(channels::SCALAR, scalar_channel(1.25))
        .channel(channels::IMAGE, image_channel(4, 3))
        .channel(channels::FLOAT_IMAGE, float_image_channel(3, 2))
        .channel(channels::WAVEFORM, waveform_channel(16))
        .channel(channels::VECTOR, vector_channel(8))
        .build()
}

/// Manifest entries covering every channel of [`sample_record`] plus one spare.
pub fn sample_manifest_entries() -> Vec<(&'static str, ChannelKind)> {
    vec![
        (channels::SCALAR, ChannelKind::Scalar),
        (channels::IMAGE, ChannelKind::Image),
        (channels::FLOAT_IMAGE, ChannelKind::FloatImage),
        (channels::WAVEFORM, ChannelKind::Waveform),
        (channels::VECTOR, ChannelKind::Vector),
        (channels::SPARE_SCALAR, ChannelKind::Scalar),
    ]
}

/// [`sample_manifest_entries`] as a manifest JSON document.
pub fn sample_manifest_json() -> String {
    let channels: serde_json::Map<String, serde_json::Value> = sample_manifest_entries()
        .into_iter()
        .map(|(name, kind)| (name.to_string(), serde_json::json!({ "type": kind })))
        .collect();
    serde_json::json!({ "_id": "test-manifest", "channels": channels }).to_string()
}

/// Write [`sample_manifest_json`] to a temporary file.
pub fn sample_manifest_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(sample_manifest_json().as_bytes())
        .expect("Failed to write manifest");
    file
}
