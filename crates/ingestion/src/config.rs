//! Ingestion configuration and the fixed per-kind channel layout.

use serde::{Deserialize, Serialize};
use shot_common::ChannelKind;

/// Name of the record attribute carrying the file format version.
pub const VERSION_ATTRIBUTE: &str = "epac_ops_data_version";

/// Which `<major>.<minor>` file versions are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPolicy {
    /// Files with any other major version are rejected
    pub supported_major: u32,
    /// Higher minor versions are ingested with a warning
    pub max_minor: u32,
}

impl Default for VersionPolicy {
    fn default() -> Self {
        Self {
            supported_major: 1,
            max_minor: 0,
        }
    }
}

/// Configuration for the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub version_policy: VersionPolicy,
    /// Maximum number of payload uploads in flight
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
}

fn default_upload_concurrency() -> usize {
    4
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version_policy: VersionPolicy::default(),
            upload_concurrency: default_upload_concurrency(),
        }
    }
}

/// Payload (dataset) names a channel of `kind` may carry.
pub fn accepted_payloads(kind: ChannelKind) -> &'static [&'static str] {
    match kind {
        ChannelKind::Waveform => &["x", "y"],
        ChannelKind::Scalar
        | ChannelKind::Image
        | ChannelKind::FloatImage
        | ChannelKind::Vector => &["data"],
    }
}

/// Optional attributes understood for a channel of `kind`.
pub fn optional_attributes(kind: ChannelKind) -> &'static [&'static str] {
    match kind {
        ChannelKind::Scalar => &["units"],
        ChannelKind::Image => &[
            "exposure_time_s",
            "gain",
            "x_pixel_size",
            "x_pixel_units",
            "y_pixel_size",
            "y_pixel_units",
            "bit_depth",
        ],
        ChannelKind::FloatImage => &[
            "x_pixel_size",
            "x_pixel_units",
            "y_pixel_size",
            "y_pixel_units",
        ],
        ChannelKind::Waveform => &["x_units", "y_units"],
        ChannelKind::Vector => &["units", "labels"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_version_policy() {
        let policy = VersionPolicy::default();
        assert_eq!(policy.supported_major, 1);
        assert_eq!(policy.max_minor, 0);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: IngestConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.version_policy, VersionPolicy::default());
        assert_eq!(config.upload_concurrency, 4);

        let config: IngestConfig =
            serde_json::from_str(r#"{"version_policy":{"supported_major":2,"max_minor":3}}"#)
                .unwrap();
        assert_eq!(config.version_policy.supported_major, 2);
        assert_eq!(config.version_policy.max_minor, 3);
    }

    #[test]
    fn test_payload_layout() {
        assert_eq!(accepted_payloads(ChannelKind::Waveform), &["x", "y"]);
        for kind in [ChannelKind::Scalar, ChannelKind::Image, ChannelKind::Vector] {
            assert_eq!(accepted_payloads(kind), &["data"]);
        }
        assert!(optional_attributes(ChannelKind::Image).contains(&"bit_depth"));
        assert!(!optional_attributes(ChannelKind::FloatImage).contains(&"gain"));
    }
}
