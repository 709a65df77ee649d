//! Common types and utilities shared across all shot-gateway crates.

pub mod error;
pub mod raw;
pub mod record;
pub mod time;

pub use error::{ShotError, ShotResult};
pub use raw::{ArrayData, ElementType, RawArray, RawChannel, RawRecord, RawValue};
pub use record::{
    ChannelKind, FloatImageChannel, FloatPixels, ImageChannel, ImagePixels, PixelData,
    RecordMetadata, ScalarChannel, ScalarValue, StoredChannel, StoredRecord, ValidatedChannel,
    ValidatedRecord, VectorChannel, WaveformChannel,
};
pub use time::{format_record_id, parse_timestamp, TimeParseError};
