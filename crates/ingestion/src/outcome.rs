//! Per-channel accept/reject outcome of an ingest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a channel was rejected.
///
/// Serialized as a bare string for a single reason and as an array when the
/// channel checks produced a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rejection {
    Single(String),
    Many(Vec<String>),
}

impl Rejection {
    pub fn reasons(&self) -> Vec<&str> {
        match self {
            Rejection::Single(reason) => vec![reason.as_str()],
            Rejection::Many(reasons) => reasons.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, reason: &str) -> bool {
        self.reasons().contains(&reason)
    }
}

/// Accepted and rejected channels plus warnings for one ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub accepted_channels: Vec<String>,
    pub rejected_channels: BTreeMap<String, Rejection>,
    pub warnings: Vec<String>,
}

impl IngestOutcome {
    pub fn with_warnings(warnings: Vec<String>) -> Self {
        Self {
            warnings,
            ..Self::default()
        }
    }

    /// Mark `name` accepted. A channel is listed at most once.
    pub fn accept(&mut self, name: &str) {
        self.rejected_channels.remove(name);
        if !self.is_accepted(name) {
            self.accepted_channels.push(name.to_string());
        }
    }

    /// Reject `name` with a single reason, withdrawing any earlier acceptance.
    pub fn reject(&mut self, name: &str, reason: impl Into<String>) {
        self.accepted_channels.retain(|accepted| accepted != name);
        self.rejected_channels
            .insert(name.to_string(), Rejection::Single(reason.into()));
    }

    /// Reject `name` with the list of reasons produced by the channel checks.
    pub fn reject_all(&mut self, name: &str, reasons: Vec<String>) {
        self.accepted_channels.retain(|accepted| accepted != name);
        self.rejected_channels
            .insert(name.to_string(), Rejection::Many(reasons));
    }

    pub fn is_accepted(&self, name: &str) -> bool {
        self.accepted_channels
            .iter()
            .any(|accepted| accepted == name)
    }
}

/// Body returned for a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// `Added as <id>` or `Updated <id>`
    pub message: String,
    pub response: IngestOutcome,
}
