//! # Telematics Scoring
//!
//! Hybrid driver risk scoring over a telemetry window:
//! - **Factor analysis**: seven rule-based risk factors
//! - **Traditional score**: weighted composite of the factors
//! - **ML stage**: feature extraction and a pluggable predictor
//! - **Blending**: confidence-weighted hybrid with traditional fallback
//! - **Result cache**: TTL cache for scores, trends and statistics
//!
//! The [`ScoringService`] ties these together behind the
//! [`telematics_common::ScoreProvider`] interface used by pricing.

pub mod advice;
pub mod blend;
pub mod cache;
pub mod factors;
pub mod metrics;
pub mod ml;
pub mod service;
pub mod source;
pub mod stats;
pub mod traditional;
pub mod trend;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use advice::{recommendations, Priority, Recommendation};
pub use blend::{BlendConfig, BlendOutcome, BlendState, HybridBlender};
pub use cache::{CacheKey, CacheKind, CacheStats, CachedValue, ResultCache};
pub use factors::{FactorAnalyzer, FactorConfig};
pub use metrics::ScoringMetrics;
pub use ml::{
    DisabledPredictor, HeuristicPredictor, MlFeatureExtractor, MlFeatures, MlPrediction,
    Prediction, RiskPredictor, StaticPredictor, SubprocessPredictor, UnavailableReason,
};
pub use service::{RiskAnalysis, ScoringService};
pub use source::InMemoryTelemetrySource;
pub use stats::DrivingStats;
pub use traditional::{FactorWeights, TraditionalScore, TraditionalScorer};
pub use trend::{RiskTrend, TrendPoint, MAX_TREND_WEEKS};

/// Scoring service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub factors: FactorConfig,
    pub weights: FactorWeights,
    pub blend: BlendConfig,
    /// Records at which a window counts as sufficient data
    pub sufficient_data_points: usize,
    /// Budget for one ML prediction
    pub ml_timeout_ms: u64,
    pub risk_score_ttl_minutes: u64,
    pub driving_stats_ttl_minutes: u64,
    pub risk_trend_ttl_minutes: u64,
    pub max_trend_weeks: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            factors: FactorConfig::default(),
            weights: FactorWeights::default(),
            blend: BlendConfig::default(),
            sufficient_data_points: telematics_common::SUFFICIENT_DATA_POINTS,
            ml_timeout_ms: 5_000,
            risk_score_ttl_minutes: 10,
            driving_stats_ttl_minutes: 5,
            risk_trend_ttl_minutes: 15,
            max_trend_weeks: MAX_TREND_WEEKS,
        }
    }
}

impl ScoringConfig {
    pub fn ml_timeout(&self) -> Duration {
        Duration::from_millis(self.ml_timeout_ms)
    }

    /// TTL for a cached result family
    pub fn ttl(&self, kind: CacheKind) -> Duration {
        let minutes = match kind {
            CacheKind::RiskScore => self.risk_score_ttl_minutes,
            CacheKind::DrivingStats => self.driving_stats_ttl_minutes,
            CacheKind::RiskTrend => self.risk_trend_ttl_minutes,
        };
        Duration::from_secs(minutes * 60)
    }
}
