//! Canonical, validated shot records and their persisted document shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::time::format_record_id;

/// Declared kind of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Scalar,
    Image,
    FloatImage,
    Waveform,
    Vector,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 5] = [
        ChannelKind::Scalar,
        ChannelKind::Image,
        ChannelKind::FloatImage,
        ChannelKind::Waveform,
        ChannelKind::Vector,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Scalar => "scalar",
            ChannelKind::Image => "image",
            ChannelKind::FloatImage => "float_image",
            ChannelKind::Waveform => "waveform",
            ChannelKind::Vector => "vector",
        }
    }

    /// Whether channel data lives in object storage rather than in the record.
    pub fn has_external_payload(&self) -> bool {
        !matches!(self, ChannelKind::Scalar)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unsupported channel kind: {}", s))
    }
}

/// Record-level metadata of a validated shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub epac_ops_data_version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub shotnum: Option<u64>,
    pub active_area: String,
    #[serde(default)]
    pub active_experiment: Option<String>,
}

impl RecordMetadata {
    pub fn record_id(&self) -> String {
        format_record_id(&self.timestamp)
    }
}

/// Value of a scalar channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

/// Pixel buffer of an integer image, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePixels {
    pub width: usize,
    pub height: usize,
    pub data: PixelData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl PixelData {
    pub fn bit_depth(&self) -> u32 {
        match self {
            PixelData::U8(_) => 8,
            PixelData::U16(_) => 16,
        }
    }
}

/// Pixel buffer of a floating point image, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatPixels {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarChannel {
    pub data: ScalarValue,
    #[serde(default)]
    pub units: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageChannel {
    pub pixels: ImagePixels,
    #[serde(default)]
    pub exposure_time_s: Option<f64>,
    #[serde(default)]
    pub gain: Option<f64>,
    #[serde(default)]
    pub x_pixel_size: Option<f64>,
    #[serde(default)]
    pub x_pixel_units: Option<String>,
    #[serde(default)]
    pub y_pixel_size: Option<f64>,
    #[serde(default)]
    pub y_pixel_units: Option<String>,
    /// Significant bits per pixel as declared by the detector
    #[serde(default)]
    pub bit_depth: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatImageChannel {
    pub pixels: FloatPixels,
    #[serde(default)]
    pub x_pixel_size: Option<f64>,
    #[serde(default)]
    pub x_pixel_units: Option<String>,
    #[serde(default)]
    pub y_pixel_size: Option<f64>,
    #[serde(default)]
    pub y_pixel_units: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformChannel {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    #[serde(default)]
    pub x_units: Option<String>,
    #[serde(default)]
    pub y_units: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorChannel {
    pub data: Vec<f64>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

/// A channel that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel_dtype", rename_all = "snake_case")]
pub enum ValidatedChannel {
    Scalar(ScalarChannel),
    Image(ImageChannel),
    FloatImage(FloatImageChannel),
    Waveform(WaveformChannel),
    Vector(VectorChannel),
}

impl ValidatedChannel {
    pub fn kind(&self) -> ChannelKind {
        match self {
            ValidatedChannel::Scalar(_) => ChannelKind::Scalar,
            ValidatedChannel::Image(_) => ChannelKind::Image,
            ValidatedChannel::FloatImage(_) => ChannelKind::FloatImage,
            ValidatedChannel::Waveform(_) => ChannelKind::Waveform,
            ValidatedChannel::Vector(_) => ChannelKind::Vector,
        }
    }

    /// Descriptive attributes kept in the record document (no bulk data).
    pub fn attributes(&self) -> BTreeMap<String, JsonValue> {
        let mut attrs = BTreeMap::new();
        match self {
            ValidatedChannel::Scalar(c) => {
                put(&mut attrs, "units", &c.units);
            }
            ValidatedChannel::Image(c) => {
                put(&mut attrs, "exposure_time_s", &c.exposure_time_s);
                put(&mut attrs, "gain", &c.gain);
                put(&mut attrs, "x_pixel_size", &c.x_pixel_size);
                put(&mut attrs, "x_pixel_units", &c.x_pixel_units);
                put(&mut attrs, "y_pixel_size", &c.y_pixel_size);
                put(&mut attrs, "y_pixel_units", &c.y_pixel_units);
                put(&mut attrs, "bit_depth", &c.bit_depth);
            }
            ValidatedChannel::FloatImage(c) => {
                put(&mut attrs, "x_pixel_size", &c.x_pixel_size);
                put(&mut attrs, "x_pixel_units", &c.x_pixel_units);
                put(&mut attrs, "y_pixel_size", &c.y_pixel_size);
                put(&mut attrs, "y_pixel_units", &c.y_pixel_units);
            }
            ValidatedChannel::Waveform(c) => {
                put(&mut attrs, "x_units", &c.x_units);
                put(&mut attrs, "y_units", &c.y_units);
            }
            ValidatedChannel::Vector(c) => {
                put(&mut attrs, "units", &c.units);
                put(&mut attrs, "labels", &c.labels);
            }
        }
        attrs
    }
}

fn put<T>(attrs: &mut BTreeMap<String, JsonValue>, key: &str, value: &Option<T>)
where
    T: Clone + Into<JsonValue>,
{
    if let Some(v) = value {
        attrs.insert(key.to_string(), v.clone().into());
    }
}

/// A fully validated shot record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub metadata: RecordMetadata,
    #[serde(default)]
    pub channels: BTreeMap<String, ValidatedChannel>,
}

impl ValidatedRecord {
    pub fn record_id(&self) -> String {
        self.metadata.record_id()
    }
}

/// Channel entry of a persisted record document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChannel {
    pub channel_dtype: ChannelKind,
    /// Inline value, scalars only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ScalarValue>,
    /// Object storage location of the payload, non-scalars only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_path: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A record as held by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub metadata: RecordMetadata,
    #[serde(default)]
    pub channels: BTreeMap<String, StoredChannel>,
}

impl StoredRecord {
    /// Build the persisted document for `record`.
    ///
    /// `payload_path` maps a channel name and kind to its object storage path
    /// and is only consulted for kinds with an external payload.
    pub fn from_validated<F>(record: &ValidatedRecord, payload_path: F) -> Self
    where
        F: Fn(&str, ChannelKind) -> String,
    {
        let channels = record
            .channels
            .iter()
            .map(|(name, channel)| {
                let kind = channel.kind();
                let data = match channel {
                    ValidatedChannel::Scalar(c) => Some(c.data.clone()),
                    _ => None,
                };
                let payload_path = kind
                    .has_external_payload()
                    .then(|| payload_path(name, kind));
                let stored = StoredChannel {
                    channel_dtype: kind,
                    data,
                    payload_path,
                    attributes: channel.attributes(),
                };
                (name.clone(), stored)
            })
            .collect();

        Self {
            id: record.record_id(),
            metadata: record.metadata.clone(),
            channels,
        }
    }

    pub fn channel_kind(&self, name: &str) -> Option<ChannelKind> {
        self.channels.get(name).map(|c| c.channel_dtype)
    }
}
