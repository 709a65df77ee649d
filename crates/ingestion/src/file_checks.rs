//! File-level checks: the format version marker.

use shot_common::{RawRecord, RawValue};
use tracing::warn;

use crate::config::{VersionPolicy, VERSION_ATTRIBUTE};
use crate::error::RejectFileError;

/// Result of a successful file check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// The version marker as found in the file
    pub version: String,
    pub major: u32,
    pub minor: u32,
    /// Non-fatal findings, surfaced in the ingest outcome
    pub warnings: Vec<String>,
}

/// Validate the version marker of `raw` against `policy`.
///
/// The first failure wins. A minor version above the supported maximum is
/// only a warning.
pub fn check_file(raw: &RawRecord, policy: &VersionPolicy) -> Result<FileReport, RejectFileError> {
    let value = raw
        .attribute(VERSION_ATTRIBUTE)
        .ok_or_else(|| RejectFileError::new(format!("{} does not exist", VERSION_ATTRIBUTE)))?;

    let version = match value {
        RawValue::String { value } => value.clone(),
        _ => return Err(wrong_datatype()),
    };
    let (major, minor) = parse_version(&version).ok_or_else(wrong_datatype)?;

    if major != policy.supported_major {
        return Err(RejectFileError::new(format!(
            "{} major version was not {}",
            VERSION_ATTRIBUTE, policy.supported_major
        )));
    }

    let mut warnings = Vec::new();
    if minor > policy.max_minor {
        warn!(
            version = %version,
            max_minor = policy.max_minor,
            "File minor version is newer than supported"
        );
        warnings.push(format!(
            "File minor version number too high (expected <={})",
            policy.max_minor
        ));
    }

    Ok(FileReport {
        version,
        major,
        minor,
        warnings,
    })
}

fn wrong_datatype() -> RejectFileError {
    RejectFileError::new(format!(
        "{} has wrong datatype. Should be string",
        VERSION_ATTRIBUTE
    ))
}

/// Parse `"<major>.<minor>"` with both parts non-negative integers.
fn parse_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.split_once('.')?;
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(major) || !digits(minor) {
        return None;
    }
    Some((major.parse().ok()?, minor.parse().ok()?))
}
