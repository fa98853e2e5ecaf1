//! API response types.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Error body: machine-readable kind plus a human-readable message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// `ValidationError`, `ConfigurationError`, or `NotFound`.
    pub error: String,
    pub message: String,
}

impl From<&AnalysisError> for ErrorResponse {
    fn from(e: &AnalysisError) -> Self {
        Self {
            error: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Number of locations with rate constants.
    pub locations: usize,
}
