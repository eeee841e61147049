//! Scoring service
//!
//! Loads a telemetry window, runs factor analysis and the ML stage, blends
//! the two and caches the result. Scoring a loaded window never fails: a
//! missing or misbehaving predictor degrades to the traditional score.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use telematics_common::{
    DataQuality, Result, RiskFactors, ScoreProvider, ScoreQuery, ScoreResult, ScoringMethod,
    TelematicsError, TelemetryRecord, TelemetrySource,
};
use tracing::{debug, info, instrument, warn};

use crate::advice::{recommendations, Recommendation};
use crate::blend::{BlendOutcome, BlendState, HybridBlender};
use crate::cache::{CacheKey, CacheKind, CachedValue, ResultCache};
use crate::metrics::ScoringMetrics;
use crate::ml::{MlFeatureExtractor, MlFeatures, Prediction, RiskPredictor, UnavailableReason};
use crate::stats::DrivingStats;
use crate::traditional::{TraditionalScore, TraditionalScorer};
use crate::trend::{trend_windows, RiskTrend, TrendPoint};
use crate::ScoringConfig;

/// Score plus recommendations derived from its factors
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    pub score: ScoreResult,
    pub recommendations: Vec<Recommendation>,
}

/// Hybrid scoring service
pub struct ScoringService {
    config: ScoringConfig,
    scorer: TraditionalScorer,
    extractor: MlFeatureExtractor,
    blender: HybridBlender,
    predictor: Arc<dyn RiskPredictor>,
    telemetry: Arc<dyn TelemetrySource>,
    cache: Arc<ResultCache>,
    metrics: Option<Arc<ScoringMetrics>>,
}

impl ScoringService {
    pub fn new(
        config: ScoringConfig,
        telemetry: Arc<dyn TelemetrySource>,
        predictor: Arc<dyn RiskPredictor>,
        cache: Arc<ResultCache>,
    ) -> Self {
        Self {
            scorer: TraditionalScorer::new(config.factors.clone(), config.weights.clone()),
            extractor: MlFeatureExtractor::new(config.blend.min_samples),
            blender: HybridBlender::new(config.blend.clone()),
            config,
            predictor,
            telemetry,
            cache,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ScoringMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Score an already-loaded window
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn score_window(&self, records: &[TelemetryRecord], window_days: u32) -> ScoreResult {
        let _timer = self
            .metrics
            .as_ref()
            .map(|m| m.score_duration_seconds.start_timer());
        let data_points = records.len();

        let (outcome, factors) = if self.blender.state(data_points, None) == BlendState::InsufficientData {
            debug!(data_points, "Too few records, using neutral prior");
            let outcome = self.blender.blend(data_points, &TraditionalScore::neutral(), None);
            (outcome, RiskFactors::new())
        } else {
            let traditional = self.scorer.score(records);
            let prediction = match self.extractor.extract(records) {
                Ok(features) => Some(self.predict(&features).await),
                Err(e) => {
                    debug!(error = %e, "Skipping ML stage");
                    None
                }
            };
            let outcome = self.blender.blend(data_points, &traditional, prediction.as_ref());
            (outcome, traditional.factors)
        };

        if let Some(metrics) = &self.metrics {
            metrics
                .scores_total
                .with_label_values(&[outcome.method().as_str()])
                .inc();
        }

        self.assemble(outcome, factors, data_points, window_days)
    }

    /// Blended risk score for a subject, cached
    #[instrument(skip(self), fields(subject_id = %query.subject_id))]
    pub async fn risk_score(&self, query: &ScoreQuery) -> Result<ScoreResult> {
        let window_days = query.validate()?;
        let key = CacheKey::new(CacheKind::RiskScore, &query.subject_id, window_days);

        self.cached_or_compute(key, || async move {
            let records = self.telemetry.window(&query.subject_id, window_days).await?;
            let score = self.score_window(&records, window_days).await;
            info!(
                risk_score = score.risk_score,
                method = %score.method,
                confidence = score.confidence,
                "Risk score computed"
            );
            Ok(CachedValue::Score(score))
        })
        .await?
        .into_score()
        .ok_or_else(|| cache_mismatch(CacheKind::RiskScore))
    }

    /// Rules-only score with no ML stage and no caching
    #[instrument(skip(self), fields(subject_id = %query.subject_id))]
    pub async fn traditional_score(&self, query: &ScoreQuery) -> Result<ScoreResult> {
        let window_days = query.validate()?;
        let records = self.telemetry.window(&query.subject_id, window_days).await?;
        let traditional = self.scorer.score(&records);

        let confidence = if traditional.factors.is_empty() {
            self.config.blend.insufficient_confidence
        } else {
            self.config.blend.fallback_confidence
        };

        Ok(ScoreResult {
            risk_score: traditional.risk_score,
            method: ScoringMethod::Traditional,
            confidence,
            traditional_score: Some(traditional.risk_score),
            ml_score: None,
            factors: traditional.factors,
            data_quality: self.data_quality(records.len(), window_days),
            generated_at: Utc::now(),
        })
    }

    /// Blended score with driver recommendations
    pub async fn risk_analysis(&self, query: &ScoreQuery) -> Result<RiskAnalysis> {
        let score = self.risk_score(query).await?;
        let recommendations = recommendations(&score.factors);
        Ok(RiskAnalysis {
            score,
            recommendations,
        })
    }

    /// Weekly trend over the lookback, oldest point first
    #[instrument(skip(self), fields(subject_id = %query.subject_id))]
    pub async fn risk_trend(&self, query: &ScoreQuery) -> Result<RiskTrend> {
        let window_days = query.validate()?;
        let key = CacheKey::new(CacheKind::RiskTrend, &query.subject_id, window_days);

        self.cached_or_compute(key, || async move {
            let mut points = Vec::new();
            for (week, lookback) in trend_windows(window_days, self.config.max_trend_weeks) {
                let sub_query = ScoreQuery::new(query.subject_id.clone(), i64::from(lookback));
                let score = self.risk_score(&sub_query).await?;
                points.push(TrendPoint {
                    week,
                    window_days: lookback,
                    risk_score: score.risk_score,
                    method: score.method,
                    confidence: score.confidence,
                    traditional_score: score.traditional_score,
                    ml_score: score.ml_score,
                });
            }
            points.reverse();

            debug!(points = points.len(), "Risk trend computed");
            Ok(CachedValue::Trend(RiskTrend {
                window_days,
                points,
                generated_at: Utc::now(),
            }))
        })
        .await?
        .into_trend()
        .ok_or_else(|| cache_mismatch(CacheKind::RiskTrend))
    }

    /// Descriptive statistics for a subject, cached
    #[instrument(skip(self), fields(subject_id = %query.subject_id))]
    pub async fn driving_stats(&self, query: &ScoreQuery) -> Result<DrivingStats> {
        let window_days = query.validate()?;
        let key = CacheKey::new(CacheKind::DrivingStats, &query.subject_id, window_days);

        self.cached_or_compute(key, || async move {
            let records = self.telemetry.window(&query.subject_id, window_days).await?;
            Ok(CachedValue::Stats(DrivingStats::from_records(
                &records,
                &self.config.factors,
            )))
        })
        .await?
        .into_stats()
        .ok_or_else(|| cache_mismatch(CacheKind::DrivingStats))
    }

    async fn predict(&self, features: &MlFeatures) -> Prediction {
        let timeout = self.config.ml_timeout();
        let prediction = tokio::time::timeout(timeout, self.predictor.predict(features))
            .await
            .unwrap_or(Prediction::Unavailable(UnavailableReason::Timeout(timeout)));

        if let Prediction::Unavailable(reason) = &prediction {
            if *reason == UnavailableReason::Disabled {
                debug!("ML predictor disabled");
            } else {
                warn!(
                    predictor = self.predictor.name(),
                    %reason,
                    "ML prediction unavailable, using traditional score"
                );
            }
            if let Some(metrics) = &self.metrics {
                metrics
                    .predictor_unavailable_total
                    .with_label_values(&[reason.label()])
                    .inc();
            }
        }

        prediction
    }

    async fn cached_or_compute<F, Fut>(&self, key: CacheKey, compute: F) -> Result<CachedValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedValue>>,
    {
        let ttl = self.config.ttl(key.kind);
        let mut computed = false;
        let value = self
            .cache
            .get_or_insert_with(key, ttl, || {
                computed = true;
                compute()
            })
            .await?;

        if let Some(metrics) = &self.metrics {
            if computed {
                metrics.cache_misses_total.inc();
            } else {
                metrics.cache_hits_total.inc();
            }
        }
        Ok(value)
    }

    fn assemble(
        &self,
        outcome: BlendOutcome,
        factors: RiskFactors,
        data_points: usize,
        window_days: u32,
    ) -> ScoreResult {
        ScoreResult {
            risk_score: outcome.risk_score,
            method: outcome.method(),
            confidence: outcome.confidence,
            traditional_score: outcome.traditional_score,
            ml_score: outcome.ml_score,
            factors,
            data_quality: self.data_quality(data_points, window_days),
            generated_at: Utc::now(),
        }
    }

    fn data_quality(&self, data_points: usize, window_days: u32) -> DataQuality {
        DataQuality {
            total_data_points: data_points,
            time_span_days: window_days,
            sufficient_data: data_points >= self.config.sufficient_data_points,
        }
    }
}

fn cache_mismatch(kind: CacheKind) -> TelematicsError {
    TelematicsError::Internal(format!("cached value is not a {} result", kind))
}

#[async_trait]
impl ScoreProvider for ScoringService {
    async fn risk_score(&self, query: &ScoreQuery) -> Result<ScoreResult> {
        ScoringService::risk_score(self, query).await
    }
}
