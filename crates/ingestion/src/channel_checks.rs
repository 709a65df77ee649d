//! Channel-level checks.
//!
//! Each channel is validated on its own against the manifest and the fixed
//! layout of its kind. Problems accumulate as human-readable reasons; a
//! channel with no reasons is accepted. Channels are independent, so a
//! record's channels are checked in parallel.

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use shot_common::{
    ChannelKind, FloatImageChannel, ImageChannel, RawChannel, RawValue, ScalarChannel,
    ValidatedChannel, VectorChannel, WaveformChannel,
};

use crate::coerce::{self, CoercionError, Mismatch};
use crate::config::{accepted_payloads, optional_attributes};
use crate::manifest::ChannelManifest;

pub const UNRECOGNISED_CHANNEL: &str =
    "Channel name is not recognised (does not appear in manifest)";
pub const MISSING_DTYPE: &str = "channel_dtype attribute is missing";
pub const WRONG_DTYPE: &str = "channel_dtype has wrong data type or its value is unsupported";
pub const UNEXPECTED_PAYLOAD: &str = "unexpected group or dataset in channel group";

/// Outcome of checking one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelResult {
    Accepted(ValidatedChannel),
    Rejected(Vec<String>),
}

impl ChannelResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ChannelResult::Accepted(_))
    }

    /// Rejection reasons, empty when accepted.
    pub fn reasons(&self) -> &[String] {
        match self {
            ChannelResult::Accepted(_) => &[],
            ChannelResult::Rejected(reasons) => reasons,
        }
    }
}

/// Check every channel of a record in parallel.
pub fn check_channels(
    channels: &BTreeMap<String, RawChannel>,
    manifest: &dyn ChannelManifest,
) -> BTreeMap<String, ChannelResult> {
    channels
        .par_iter()
        .map(|(name, raw)| (name.clone(), check_channel(name, raw, manifest)))
        .collect()
}

/// Check a single channel.
pub fn check_channel(
    name: &str,
    raw: &RawChannel,
    manifest: &dyn ChannelManifest,
) -> ChannelResult {
    let Some(declared) = manifest.lookup_channel_kind(name) else {
        debug!(channel = %name, "Channel not in manifest");
        return ChannelResult::Rejected(vec![UNRECOGNISED_CHANNEL.to_string()]);
    };

    let kind = match raw.attribute("channel_dtype") {
        None => return ChannelResult::Rejected(vec![MISSING_DTYPE.to_string()]),
        Some(RawValue::String { value }) => value.parse::<ChannelKind>().ok(),
        Some(_) => None,
    };
    let kind = match kind {
        Some(kind) if kind == declared => kind,
        _ => return ChannelResult::Rejected(vec![WRONG_DTYPE.to_string()]),
    };

    let mut inspector = Inspector::new(name, raw, kind);
    inspector.check_payload_names();

    let channel = match kind {
        ChannelKind::Scalar => inspector.scalar(),
        ChannelKind::Image => inspector.image(),
        ChannelKind::FloatImage => inspector.float_image(),
        ChannelKind::Waveform => inspector.waveform(),
        ChannelKind::Vector => inspector.vector(),
    };
    inspector.log_unknown_attributes();

    match channel {
        Some(channel) if inspector.reasons.is_empty() => ChannelResult::Accepted(channel),
        _ => {
            debug!(channel = %name, reasons = ?inspector.reasons, "Channel rejected");
            ChannelResult::Rejected(inspector.reasons)
        }
    }
}

/// Walks one channel of a known kind, collecting reasons as it goes.
struct Inspector<'a> {
    name: &'a str,
    raw: &'a RawChannel,
    kind: ChannelKind,
    reasons: Vec<String>,
}

impl<'a> Inspector<'a> {
    fn new(name: &'a str, raw: &'a RawChannel, kind: ChannelKind) -> Self {
        Self {
            name,
            raw,
            kind,
            reasons: Vec::new(),
        }
    }

    fn reject(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
    }

    fn check_payload_names(&mut self) {
        let accepted = accepted_payloads(self.kind);
        if self
            .raw
            .payloads
            .keys()
            .any(|key| !accepted.contains(&key.as_str()))
        {
            self.reject(UNEXPECTED_PAYLOAD);
        }
    }

    fn log_unknown_attributes(&self) {
        let known = optional_attributes(self.kind);
        for key in self.raw.attributes.keys() {
            if key != "channel_dtype" && !known.contains(&key.as_str()) {
                debug!(
                    channel = %self.name,
                    attribute = %key,
                    "Ignoring unrecognised channel attribute"
                );
            }
        }
    }

    /// Required payload `key`, with `reason` mapping a failed coercion to its message.
    fn payload<T>(
        &mut self,
        key: &str,
        convert: fn(&str, &RawValue) -> Result<T, CoercionError>,
        reason: impl Fn(&CoercionError) -> String,
    ) -> Option<T> {
        let raw = self.raw;
        let Some(value) = raw.payload(key) else {
            self.reject(format!("{} attribute is missing", key));
            return None;
        };
        match convert(key, value) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(channel = %self.name, error = %err, "Payload coercion failed");
                self.reject(reason(&err));
                None
            }
        }
    }

    fn optional<T>(
        &mut self,
        key: &str,
        convert: fn(&str, &RawValue) -> Result<T, CoercionError>,
    ) -> Option<T> {
        let raw = self.raw;
        let value = raw.attribute(key)?;
        match convert(key, value) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(channel = %self.name, error = %err, "Attribute coercion failed");
                self.reject(format!("{} attribute has wrong datatype", key));
                None
            }
        }
    }

    fn scalar(&mut self) -> Option<ValidatedChannel> {
        let data = self.payload("data", coerce::to_scalar, |_| {
            "data has wrong datatype".to_string()
        });
        let units = self.optional("units", coerce::to_string);

        Some(ValidatedChannel::Scalar(ScalarChannel {
            data: data?,
            units,
        }))
    }

    fn image(&mut self) -> Option<ValidatedChannel> {
        let pixels = self.payload("data", coerce::to_image_pixels, |err| {
            array_reason(
                err,
                "data attribute has wrong datatype, should be uint16 or uint8",
            )
        });
        let exposure_time_s = self.optional("exposure_time_s", coerce::to_f64);
        let gain = self.optional("gain", coerce::to_f64);
        let x_pixel_size = self.optional("x_pixel_size", coerce::to_f64);
        let x_pixel_units = self.optional("x_pixel_units", coerce::to_string);
        let y_pixel_size = self.optional("y_pixel_size", coerce::to_f64);
        let y_pixel_units = self.optional("y_pixel_units", coerce::to_string);
        let bit_depth = self.optional("bit_depth", coerce::to_u32);

        Some(ValidatedChannel::Image(ImageChannel {
            pixels: pixels?,
            exposure_time_s,
            gain,
            x_pixel_size,
            x_pixel_units,
            y_pixel_size,
            y_pixel_units,
            bit_depth,
        }))
    }

    fn float_image(&mut self) -> Option<ValidatedChannel> {
        let pixels = self.payload("data", coerce::to_float_pixels, |err| {
            array_reason(
                err,
                "data attribute has wrong datatype, should be float32 or float64",
            )
        });
        let x_pixel_size = self.optional("x_pixel_size", coerce::to_f64);
        let x_pixel_units = self.optional("x_pixel_units", coerce::to_string);
        let y_pixel_size = self.optional("y_pixel_size", coerce::to_f64);
        let y_pixel_units = self.optional("y_pixel_units", coerce::to_string);

        Some(ValidatedChannel::FloatImage(FloatImageChannel {
            pixels: pixels?,
            x_pixel_size,
            x_pixel_units,
            y_pixel_size,
            y_pixel_units,
        }))
    }

    fn waveform(&mut self) -> Option<ValidatedChannel> {
        let x = self.payload("x", coerce::to_series, |err| series_reason(err, "x"));
        let y = self.payload("y", coerce::to_series, |err| series_reason(err, "y"));
        let x_units = self.optional("x_units", coerce::to_string);
        let y_units = self.optional("y_units", coerce::to_string);

        Some(ValidatedChannel::Waveform(WaveformChannel {
            x: x?,
            y: y?,
            x_units,
            y_units,
        }))
    }

    fn vector(&mut self) -> Option<ValidatedChannel> {
        let data = self.payload("data", coerce::to_series, |err| series_reason(err, "data"));
        let units = self.optional("units", coerce::to_string);
        let labels = self.optional("labels", coerce::to_string_list);

        Some(ValidatedChannel::Vector(VectorChannel {
            data: data?,
            units,
            labels,
        }))
    }
}

fn array_reason(err: &CoercionError, type_reason: &str) -> String {
    match err.mismatch {
        Mismatch::Type => type_reason.to_string(),
        Mismatch::Shape => "data attribute has wrong shape".to_string(),
    }
}

fn series_reason(err: &CoercionError, key: &str) -> String {
    match err.mismatch {
        Mismatch::Type => format!(
            "{} attribute has wrong datatype, should be a list of floats",
            key
        ),
        Mismatch::Shape => format!("{} attribute has wrong shape", key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestFile;
    use shot_common::ArrayData;

    fn manifest() -> ManifestFile {
        ManifestFile::from_entries([
            ("SCALAR", ChannelKind::Scalar),
            ("IMAGE", ChannelKind::Image),
            ("FLOAT-IMAGE", ChannelKind::FloatImage),
            ("TRACE", ChannelKind::Waveform),
            ("SPECTRUM", ChannelKind::Vector),
        ])
    }

    fn channel(kind: &str) -> RawChannel {
        RawChannel::new().with_attribute("channel_dtype", RawValue::string(kind))
    }

    fn image_data() -> RawValue {
        RawValue::array(vec![2, 2], ArrayData::U8(vec![1, 2, 3, 4]))
    }

    fn series(values: Vec<f64>) -> RawValue {
        RawValue::array(vec![values.len()], ArrayData::F64(values))
    }

    fn reasons(name: &str, raw: &RawChannel) -> Vec<String> {
        match check_channel(name, raw, &manifest()) {
            ChannelResult::Rejected(reasons) => reasons,
            ChannelResult::Accepted(channel) => panic!("unexpectedly accepted {:?}", channel),
        }
    }

    #[test]
    fn test_unknown_channel_has_single_reason() {
        let raw = channel("scalar")
            .with_payload("data", RawValue::Bool { value: true })
            .with_payload("junk", RawValue::int(1));
        assert_eq!(reasons("NOT-IN-MANIFEST", &raw), vec![UNRECOGNISED_CHANNEL]);
    }

    #[test]
    fn test_channel_dtype_checks_are_terminal() {
        let raw = RawChannel::new().with_payload("junk", RawValue::int(1));
        assert_eq!(reasons("SCALAR", &raw), vec![MISSING_DTYPE]);

        let raw = RawChannel::new().with_attribute("channel_dtype", RawValue::int(1));
        assert_eq!(reasons("SCALAR", &raw), vec![WRONG_DTYPE]);

        assert_eq!(reasons("SCALAR", &channel("rgb-image")), vec![WRONG_DTYPE]);
        assert_eq!(reasons("SCALAR", &channel("image")), vec![WRONG_DTYPE]);
    }

    #[test]
    fn test_scalar_channel() {
        let raw = channel("scalar")
            .with_payload("data", RawValue::float(1.5))
            .with_attribute("units", RawValue::string("mJ"));
        let result = check_channel("SCALAR", &raw, &manifest());
        assert_eq!(
            result,
            ChannelResult::Accepted(ValidatedChannel::Scalar(ScalarChannel {
                data: shot_common::ScalarValue::Float(1.5),
                units: Some("mJ".to_string()),
            }))
        );
    }

    #[test]
    fn test_scalar_channel_failures_accumulate() {
        let raw = channel("scalar").with_attribute("units", RawValue::float(1.0));
        assert_eq!(
            reasons("SCALAR", &raw),
            vec![
                "data attribute is missing",
                "units attribute has wrong datatype"
            ]
        );

        let raw = channel("scalar").with_payload("data", series(vec![1.0]));
        assert_eq!(reasons("SCALAR", &raw), vec!["data has wrong datatype"]);
    }

    #[test]
    fn test_float_image_data_in_image_channel() {
        let raw = channel("image").with_payload(
            "data",
            RawValue::array(vec![2, 2], ArrayData::F32(vec![0.0; 4])),
        );
        assert_eq!(
            reasons("IMAGE", &raw),
            vec!["data attribute has wrong datatype, should be uint16 or uint8"]
        );
    }

    #[test]
    fn test_image_channel_attributes() {
        let raw = channel("image")
            .with_payload("data", image_data())
            .with_attribute("exposure_time_s", RawValue::float(0.001))
            .with_attribute("bit_depth", RawValue::uint(12))
            .with_attribute("x_pixel_units", RawValue::string("µm"))
            .with_attribute("comment", RawValue::string("ignored"));

        match check_channel("IMAGE", &raw, &manifest()) {
            ChannelResult::Accepted(ValidatedChannel::Image(image)) => {
                assert_eq!(image.pixels.width, 2);
                assert_eq!(image.exposure_time_s, Some(0.001));
                assert_eq!(image.bit_depth, Some(12));
                assert_eq!(image.x_pixel_units.as_deref(), Some("µm"));
                assert_eq!(image.gain, None);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_image_channel_failures() {
        let raw = channel("image")
            .with_payload("data", RawValue::array(vec![4], ArrayData::U16(vec![0; 4])))
            .with_attribute("gain", RawValue::int(5))
            .with_attribute("y_pixel_units", RawValue::float(1.0));
        assert_eq!(
            reasons("IMAGE", &raw),
            vec![
                "data attribute has wrong shape",
                "gain attribute has wrong datatype",
                "y_pixel_units attribute has wrong datatype",
            ]
        );
    }

    #[test]
    fn test_float_image_channel() {
        let raw = channel("float_image").with_payload(
            "data",
            RawValue::array(vec![1, 2], ArrayData::F64(vec![0.25, 0.5])),
        );
        assert!(check_channel("FLOAT-IMAGE", &raw, &manifest()).is_accepted());

        let raw = channel("float_image").with_payload("data", image_data());
        assert_eq!(
            reasons("FLOAT-IMAGE", &raw),
            vec!["data attribute has wrong datatype, should be float32 or float64"]
        );
    }

    #[test]
    fn test_waveform_channel() {
        let raw = channel("waveform")
            .with_payload("x", series(vec![1.0, 2.0, 3.0]))
            .with_payload("y", series(vec![4.0, 5.0]))
            .with_attribute("x_units", RawValue::string("ns"));
        match check_channel("TRACE", &raw, &manifest()) {
            ChannelResult::Accepted(ValidatedChannel::Waveform(w)) => {
                assert_eq!(w.x.len(), 3);
                assert_eq!(w.y.len(), 2);
                assert_eq!(w.x_units.as_deref(), Some("ns"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_waveform_failures() {
        let raw = channel("waveform").with_payload("x", RawValue::float(1.0));
        assert_eq!(
            reasons("TRACE", &raw),
            vec!["x attribute has wrong shape", "y attribute is missing"]
        );

        let raw = channel("waveform")
            .with_payload("x", RawValue::string_list(["a"]))
            .with_payload("y", series(vec![1.0]));
        assert_eq!(
            reasons("TRACE", &raw),
            vec!["x attribute has wrong datatype, should be a list of floats"]
        );
    }

    #[test]
    fn test_unexpected_payload_accumulates() {
        let raw = channel("waveform")
            .with_payload("x", series(vec![1.0]))
            .with_payload("data", series(vec![1.0]))
            .with_payload("extra", series(vec![1.0]));
        assert_eq!(
            reasons("TRACE", &raw),
            vec![UNEXPECTED_PAYLOAD, "y attribute is missing"]
        );
    }

    #[test]
    fn test_vector_channel() {
        let raw = channel("vector")
            .with_payload(
                "data",
                RawValue::array(vec![3], ArrayData::I16(vec![1, 2, 3])),
            )
            .with_attribute("labels", RawValue::string_list(["a", "b", "c"]));
        match check_channel("SPECTRUM", &raw, &manifest()) {
            ChannelResult::Accepted(ValidatedChannel::Vector(v)) => {
                assert_eq!(v.data, vec![1.0, 2.0, 3.0]);
                assert_eq!(v.labels.unwrap().len(), 3);
            }
            other => panic!("unexpected result {:?}", other),
        }

        let raw = channel("vector")
            .with_payload("data", series(vec![1.0]))
            .with_attribute("labels", RawValue::string("a"));
        assert_eq!(
            reasons("SPECTRUM", &raw),
            vec!["labels attribute has wrong datatype"]
        );
    }

    #[test]
    fn test_check_channels_covers_every_channel() {
        let mut channels = BTreeMap::new();
        channels.insert(
            "SCALAR".to_string(),
            channel("scalar").with_payload("data", RawValue::int(3)),
        );
        channels.insert("TRACE".to_string(), channel("waveform"));
        channels.insert("UNKNOWN".to_string(), channel("scalar"));

        let results = check_channels(&channels, &manifest());
        assert_eq!(results.len(), 3);
        assert!(results["SCALAR"].is_accepted());
        assert_eq!(
            results["TRACE"].reasons(),
            ["x attribute is missing", "y attribute is missing"]
        );
        assert_eq!(results["UNKNOWN"].reasons(), [UNRECOGNISED_CHANNEL]);
    }
}
