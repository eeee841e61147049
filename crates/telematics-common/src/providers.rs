//! Collaborator interfaces
//!
//! Scoring reads telemetry through [`TelemetrySource`]; pricing reads scores
//! through the read-only [`ScoreProvider`] and demographics through
//! [`DemographicProvider`]. Scoring never depends on pricing.

use async_trait::async_trait;

use crate::error::{DemographicError, Result};
use crate::types::quote::DemographicProfile;
use crate::types::risk::{ScoreQuery, ScoreResult};
use crate::types::telemetry::TelemetryRecord;

/// Supplies the already-filtered telemetry window for a subject
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Records for the last `window_days` days, ordered by timestamp
    async fn window(&self, subject_id: &str, window_days: u32) -> Result<Vec<TelemetryRecord>>;
}

/// Read-only access to risk scores
#[async_trait]
pub trait ScoreProvider: Send + Sync {
    async fn risk_score(&self, query: &ScoreQuery) -> Result<ScoreResult>;
}

/// Demographic lookup for a subject
#[async_trait]
pub trait DemographicProvider: Send + Sync {
    async fn profile(&self, subject_id: &str)
        -> std::result::Result<DemographicProfile, DemographicError>;
}
