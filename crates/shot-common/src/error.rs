//! Error types for shot-gateway storage and service plumbing.

use thiserror::Error;

/// Result type alias using ShotError.
pub type ShotResult<T> = Result<T, ShotError>;

/// Primary error type for collaborator operations (storage, catalog, manifest).
#[derive(Debug, Error)]
pub enum ShotError {
    // === Input Errors ===
    #[error("Invalid record document: {0}")]
    InvalidDocument(String),

    #[error("Invalid channel manifest: {0}")]
    InvalidManifest(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Record already exists: {0}")]
    RecordExists(String),

    // === Storage Errors ===
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ShotError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ShotError::InvalidDocument(_) | ShotError::InvalidManifest(_) => 400,
            ShotError::RecordNotFound(_) => 404,
            ShotError::RecordExists(_) => 409,
            ShotError::ServiceUnavailable(_) => 503,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for ShotError {
    fn from(err: std::io::Error) -> Self {
        ShotError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for ShotError {
    fn from(err: serde_json::Error) -> Self {
        ShotError::InternalError(format!("JSON error: {}", err))
    }
}
