//! ML predictor contract
//!
//! A predictor never fails the caller. Timeouts, crashes and garbage output
//! all collapse into [`Prediction::Unavailable`] and the blender falls back
//! to the traditional score.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::features::MlFeatures;

/// A successful ML prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MlPrediction {
    /// Risk score in [0, 100]
    pub risk_score: f64,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Coarse risk band 0-3, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<u8>,
}

impl MlPrediction {
    /// Build a prediction, rejecting non-finite or out-of-range values
    pub fn checked(
        risk_score: f64,
        confidence: f64,
        risk_level: Option<u8>,
    ) -> Result<Self, UnavailableReason> {
        if !risk_score.is_finite() || !(0.0..=100.0).contains(&risk_score) {
            return Err(UnavailableReason::MalformedOutput(format!(
                "risk_score out of range: {}",
                risk_score
            )));
        }
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(UnavailableReason::MalformedOutput(format!(
                "confidence out of range: {}",
                confidence
            )));
        }
        Ok(Self {
            risk_score,
            confidence,
            risk_level,
        })
    }
}

/// Why no prediction was produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnavailableReason {
    #[error("predictor timed out after {0:?}")]
    Timeout(Duration),

    #[error("predictor could not be started: {0}")]
    Spawn(String),

    #[error("predictor failed: {0}")]
    ProcessFailed(String),

    #[error("predictor output malformed: {0}")]
    MalformedOutput(String),

    #[error("feature encoding failed: {0}")]
    Encoding(String),

    #[error("predictor disabled")]
    Disabled,
}

impl UnavailableReason {
    /// Short label for metrics
    pub fn label(&self) -> &'static str {
        match self {
            UnavailableReason::Timeout(_) => "timeout",
            UnavailableReason::Spawn(_) => "spawn",
            UnavailableReason::ProcessFailed(_) => "process_failed",
            UnavailableReason::MalformedOutput(_) => "malformed_output",
            UnavailableReason::Encoding(_) => "encoding",
            UnavailableReason::Disabled => "disabled",
        }
    }
}

/// Outcome of one predictor call
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Available(MlPrediction),
    Unavailable(UnavailableReason),
}

impl Prediction {
    pub fn available(&self) -> Option<&MlPrediction> {
        match self {
            Prediction::Available(prediction) => Some(prediction),
            Prediction::Unavailable(_) => None,
        }
    }
}

impl From<Result<MlPrediction, UnavailableReason>> for Prediction {
    fn from(result: Result<MlPrediction, UnavailableReason>) -> Self {
        match result {
            Ok(prediction) => Prediction::Available(prediction),
            Err(reason) => Prediction::Unavailable(reason),
        }
    }
}

/// Produces a risk prediction from a feature vector
#[async_trait]
pub trait RiskPredictor: Send + Sync {
    async fn predict(&self, features: &MlFeatures) -> Prediction;

    /// Name used in logs
    fn name(&self) -> &'static str;
}

/// Predictor that is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPredictor;

#[async_trait]
impl RiskPredictor for DisabledPredictor {
    async fn predict(&self, _features: &MlFeatures) -> Prediction {
        Prediction::Unavailable(UnavailableReason::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Predictor returning a fixed outcome, optionally after a delay
#[derive(Debug, Clone)]
pub struct StaticPredictor {
    outcome: Prediction,
    delay: Option<Duration>,
}

impl StaticPredictor {
    pub fn available(risk_score: f64, confidence: f64) -> Self {
        Self {
            outcome: Prediction::Available(MlPrediction {
                risk_score,
                confidence,
                risk_level: None,
            }),
            delay: None,
        }
    }

    pub fn unavailable(reason: UnavailableReason) -> Self {
        Self {
            outcome: Prediction::Unavailable(reason),
            delay: None,
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl RiskPredictor for StaticPredictor {
    async fn predict(&self, _features: &MlFeatures) -> Prediction {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
