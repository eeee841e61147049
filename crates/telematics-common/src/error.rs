//! Error types for the telematics scoring and pricing core
//!
//! Provides a unified error type and domain-specific error variants.
//! Only [`RequestError`] is meant to reach a caller; every other analytic
//! failure has a deterministic fallback value at the point where it occurs.

use thiserror::Error;

/// Result type alias using TelematicsError
pub type Result<T> = std::result::Result<T, TelematicsError>;

/// Unified error type for telematics operations
#[derive(Debug, Error)]
pub enum TelematicsError {
    // Caller misuse (400-equivalent)
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    // Analysis errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    // Demographic lookup errors
    #[error("Demographic lookup error: {0}")]
    Demographic(#[from] DemographicError),

    // Telemetry source errors
    #[error("Telemetry source error: {0}")]
    Telemetry(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Metrics registry errors
    #[error("Metrics error: {0}")]
    Metrics(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TelematicsError {
    /// Whether this error describes an invalid request rather than a
    /// data or runtime condition.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TelematicsError::InvalidRequest(_))
    }
}

/// Request-shape violations
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("Malformed coverage type: {0:?}")]
    MalformedCoverageType(String),

    #[error("Window must be between 1 and 36500 days, got {0}")]
    InvalidWindow(i64),

    #[error("Subject id must not be empty")]
    EmptySubject,

    #[error("Invalid usage input: {0}")]
    InvalidUsage(String),
}

/// Telemetry analysis errors
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("Telemetry window is empty")]
    EmptyInput,

    #[error("Insufficient telemetry: {count} records, {required} required")]
    InsufficientData { count: usize, required: usize },
}

/// Demographic lookup errors
#[derive(Debug, Error, PartialEq)]
pub enum DemographicError {
    #[error("No demographic profile for subject: {0}")]
    NotFound(String),

    #[error("Demographic source unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for TelematicsError {
    fn from(err: serde_json::Error) -> Self {
        TelematicsError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for TelematicsError {
    fn from(err: std::io::Error) -> Self {
        TelematicsError::Telemetry(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelematicsError::InvalidRequest(RequestError::InvalidWindow(-3));
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn test_insufficient_data_display() {
        let err = AnalysisError::InsufficientData {
            count: 49,
            required: 50,
        };
        assert!(err.to_string().contains("49 records, 50 required"));
    }

    #[test]
    fn test_only_request_errors_are_client_errors() {
        assert!(TelematicsError::from(RequestError::EmptySubject).is_client_error());
        assert!(!TelematicsError::from(AnalysisError::EmptyInput).is_client_error());
        assert!(
            !TelematicsError::from(DemographicError::NotFound("u1".into())).is_client_error()
        );
        assert!(!TelematicsError::Telemetry("down".into()).is_client_error());
    }
}
