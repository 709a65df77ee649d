//! Channel manifest: the set of known channel names and their kinds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use shot_common::{ChannelKind, ShotError, ShotResult};

/// Source of the declared kind of every known channel.
pub trait ChannelManifest: Send + Sync {
    /// `None` when the channel name is not in the manifest.
    fn lookup_channel_kind(&self, name: &str) -> Option<ChannelKind>;
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

/// Manifest loaded from a JSON document of the form
/// `{"channels": {"<name>": {"type": "<kind>", ...}}}`.
///
/// Unknown entry fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestFile {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub channels: BTreeMap<String, ManifestEntry>,
}

impl ManifestFile {
    pub fn from_json(json: &str) -> ShotResult<Self> {
        serde_json::from_str(json).map_err(|e| ShotError::InvalidManifest(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> ShotResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ShotError::InvalidManifest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let manifest = Self::from_json(&json)?;

        info!(
            path = %path.display(),
            channels = manifest.channels.len(),
            "Loaded channel manifest"
        );
        Ok(manifest)
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ChannelKind)>,
        S: Into<String>,
    {
        let channels = entries
            .into_iter()
            .map(|(name, kind)| {
                let entry = ManifestEntry {
                    kind,
                    name: None,
                    units: None,
                };
                (name.into(), entry)
            })
            .collect();

        Self { id: None, channels }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl ChannelManifest for ManifestFile {
    fn lookup_channel_kind(&self, name: &str) -> Option<ChannelKind> {
        self.channels.get(name).map(|entry| entry.kind)
    }
}
