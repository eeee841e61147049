//! Prometheus metrics for the scoring service

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use telematics_common::{Result, TelematicsError};

/// Scoring metrics
pub struct ScoringMetrics {
    pub scores_total: IntCounterVec,
    pub predictor_unavailable_total: IntCounterVec,
    pub cache_hits_total: IntCounter,
    pub cache_misses_total: IntCounter,
    pub score_duration_seconds: Histogram,
}

impl ScoringMetrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            scores_total: IntCounterVec::new(
                Opts::new("telematics_scores_total", "Risk scores computed by method"),
                &["method"],
            )
            .map_err(metrics_error)?,
            predictor_unavailable_total: IntCounterVec::new(
                Opts::new(
                    "telematics_predictor_unavailable_total",
                    "ML predictions that were unavailable, by reason",
                ),
                &["reason"],
            )
            .map_err(metrics_error)?,
            cache_hits_total: IntCounter::new(
                "telematics_cache_hits_total",
                "Result cache hits",
            )
            .map_err(metrics_error)?,
            cache_misses_total: IntCounter::new(
                "telematics_cache_misses_total",
                "Result cache misses",
            )
            .map_err(metrics_error)?,
            score_duration_seconds: Histogram::with_opts(
                HistogramOpts::new(
                    "telematics_score_duration_seconds",
                    "Time to score one telemetry window",
                )
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            )
            .map_err(metrics_error)?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry
            .register(Box::new(self.scores_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(self.predictor_unavailable_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(self.cache_hits_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(self.cache_misses_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(self.score_duration_seconds.clone()))
            .map_err(metrics_error)?;
        Ok(())
    }
}

fn metrics_error(e: prometheus::Error) -> TelematicsError {
    TelematicsError::Metrics(e.to_string())
}
