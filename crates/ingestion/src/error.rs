//! Error types for the ingestion crate.

use shot_common::ShotError;
use thiserror::Error;

/// The file as a whole cannot be ingested (version marker problems).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RejectFileError(pub String);

impl RejectFileError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// The record metadata is invalid or conflicts with a stored record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RejectRecordError(pub String);

impl RejectRecordError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// Errors that abort a whole ingest.
///
/// Channel-level problems are never errors; they end up in
/// [`IngestOutcome::rejected_channels`](crate::IngestOutcome).
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("{0}")]
    RejectFile(#[from] RejectFileError),

    #[error("{0}")]
    RejectRecord(#[from] RejectRecordError),

    #[error("Failed to query record catalog: {0}")]
    Catalog(String),

    #[error("Failed to access object storage: {0}")]
    Storage(String),
}

impl IngestionError {
    /// Whether the submitted data was at fault, as opposed to a collaborator.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            IngestionError::RejectFile(_) | IngestionError::RejectRecord(_)
        )
    }

    /// Get HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        if self.is_rejection() {
            400
        } else {
            500
        }
    }

    pub(crate) fn catalog(err: ShotError) -> Self {
        IngestionError::Catalog(err.to_string())
    }

    pub(crate) fn storage(err: ShotError) -> Self {
        IngestionError::Storage(err.to_string())
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
