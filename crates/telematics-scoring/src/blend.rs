//! Hybrid blending state machine
//!
//! ```text
//! records < min_samples                   -> InsufficientData (50, conf 0.5)
//! ML available, confidence >= threshold   -> MlEnhanced
//! otherwise                               -> TraditionalFallback (conf 0.9)
//! ```
//!
//! In the ML branch the ML share is `min(confidence, max_blend_weight)`, so
//! the traditional score always keeps at least a 20% say.

use serde::{Deserialize, Serialize};
use telematics_common::{
    clamp_score, ScoringMethod, MAX_BLEND_WEIGHT, ML_CONFIDENCE_THRESHOLD, ML_MIN_SAMPLES,
    NEUTRAL_RISK_SCORE, TRADITIONAL_CONFIDENCE,
};

use crate::ml::Prediction;
use crate::traditional::TraditionalScore;

/// Blending thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendConfig {
    pub min_samples: usize,
    pub confidence_threshold: f64,
    pub max_blend_weight: f64,
    pub fallback_confidence: f64,
    pub insufficient_confidence: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            min_samples: ML_MIN_SAMPLES,
            confidence_threshold: ML_CONFIDENCE_THRESHOLD,
            max_blend_weight: MAX_BLEND_WEIGHT,
            fallback_confidence: TRADITIONAL_CONFIDENCE,
            insufficient_confidence: 0.5,
        }
    }
}

/// Which branch the blender took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendState {
    InsufficientData,
    MlEnhanced,
    TraditionalFallback,
}

impl From<BlendState> for ScoringMethod {
    fn from(state: BlendState) -> Self {
        match state {
            BlendState::InsufficientData => ScoringMethod::InsufficientData,
            BlendState::MlEnhanced => ScoringMethod::MlEnhanced,
            BlendState::TraditionalFallback => ScoringMethod::TraditionalFallback,
        }
    }
}

/// Blended score and the sub-scores behind it
#[derive(Debug, Clone, PartialEq)]
pub struct BlendOutcome {
    pub state: BlendState,
    pub risk_score: u8,
    pub confidence: f64,
    /// ML share of the final score, 0 outside the ML branch
    pub ml_weight: f64,
    pub traditional_score: Option<u8>,
    pub ml_score: Option<f64>,
}

impl BlendOutcome {
    pub fn method(&self) -> ScoringMethod {
        self.state.into()
    }
}

/// Combines traditional and ML scores
#[derive(Debug, Clone, Default)]
pub struct HybridBlender {
    config: BlendConfig,
}

impl HybridBlender {
    pub fn new(config: BlendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BlendConfig {
        &self.config
    }

    /// Branch selection only
    pub fn state(&self, data_points: usize, prediction: Option<&Prediction>) -> BlendState {
        if data_points < self.config.min_samples {
            return BlendState::InsufficientData;
        }
        match prediction.and_then(Prediction::available) {
            Some(ml) if ml.confidence >= self.config.confidence_threshold => BlendState::MlEnhanced,
            _ => BlendState::TraditionalFallback,
        }
    }

    pub fn blend(
        &self,
        data_points: usize,
        traditional: &TraditionalScore,
        prediction: Option<&Prediction>,
    ) -> BlendOutcome {
        let state = self.state(data_points, prediction);
        let ml = prediction.and_then(Prediction::available);

        match (state, ml) {
            (BlendState::MlEnhanced, Some(ml)) => {
                let weight = ml.confidence.min(self.config.max_blend_weight);
                let blended =
                    ml.risk_score * weight + f64::from(traditional.risk_score) * (1.0 - weight);
                BlendOutcome {
                    state,
                    risk_score: clamp_score(blended),
                    confidence: ml.confidence,
                    ml_weight: weight,
                    traditional_score: Some(traditional.risk_score),
                    ml_score: Some(ml.risk_score),
                }
            }
            (BlendState::InsufficientData, _) => BlendOutcome {
                state,
                risk_score: NEUTRAL_RISK_SCORE,
                confidence: self.config.insufficient_confidence,
                ml_weight: 0.0,
                traditional_score: None,
                ml_score: None,
            },
            _ => BlendOutcome {
                state: BlendState::TraditionalFallback,
                risk_score: traditional.risk_score,
                confidence: self.config.fallback_confidence,
                ml_weight: 0.0,
                traditional_score: Some(traditional.risk_score),
                ml_score: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{MlPrediction, UnavailableReason};
    use std::time::Duration;
    use telematics_common::RiskFactors;

    fn traditional(score: u8) -> TraditionalScore {
        TraditionalScore {
            risk_score: score,
            factors: RiskFactors::new(),
        }
    }

    fn ml(risk_score: f64, confidence: f64) -> Prediction {
        Prediction::Available(MlPrediction {
            risk_score,
            confidence,
            risk_level: None,
        })
    }

    #[test]
    fn test_confident_ml_blends_with_cap() {
        let blender = HybridBlender::default();
        let outcome = blender.blend(120, &traditional(40), Some(&ml(80.0, 0.9)));

        // 80 × 0.8 + 40 × 0.2
        assert_eq!(outcome.state, BlendState::MlEnhanced);
        assert_eq!(outcome.risk_score, 72);
        assert_eq!(outcome.confidence, 0.9);
        assert_eq!(outcome.ml_weight, 0.8);
        assert_eq!(outcome.traditional_score, Some(40));
        assert_eq!(outcome.ml_score, Some(80.0));
        assert_eq!(outcome.method(), ScoringMethod::MlEnhanced);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let blender = HybridBlender::default();
        let outcome = blender.blend(60, &traditional(20), Some(&ml(60.0, 0.7)));
        assert_eq!(outcome.state, BlendState::MlEnhanced);
        // 60 × 0.7 + 20 × 0.3
        assert_eq!(outcome.risk_score, 48);
    }

    #[test]
    fn test_low_confidence_falls_back() {
        let blender = HybridBlender::default();
        let outcome = blender.blend(120, &traditional(40), Some(&ml(80.0, 0.6)));
        assert_eq!(outcome.state, BlendState::TraditionalFallback);
        assert_eq!(outcome.risk_score, 40);
        assert_eq!(outcome.confidence, 0.9);
        assert_eq!(outcome.ml_score, None);
    }

    #[test]
    fn test_unavailable_falls_back() {
        let blender = HybridBlender::default();
        let timeout = Prediction::Unavailable(UnavailableReason::Timeout(Duration::from_secs(5)));
        let outcome = blender.blend(120, &traditional(33), Some(&timeout));
        assert_eq!(outcome.state, BlendState::TraditionalFallback);
        assert_eq!(outcome.risk_score, 33);

        let outcome = blender.blend(120, &traditional(33), None);
        assert_eq!(outcome.state, BlendState::TraditionalFallback);
    }

    #[test]
    fn test_too_few_records_is_neutral() {
        let blender = HybridBlender::default();
        let outcome = blender.blend(49, &traditional(90), Some(&ml(10.0, 0.99)));
        assert_eq!(outcome.state, BlendState::InsufficientData);
        assert_eq!(outcome.risk_score, 50);
        assert_eq!(outcome.confidence, 0.5);
        assert_eq!(outcome.traditional_score, None);
        assert_eq!(outcome.ml_score, None);
    }

    #[test]
    fn test_exactly_min_samples_is_scored() {
        let blender = HybridBlender::default();
        assert_eq!(blender.state(50, None), BlendState::TraditionalFallback);
        assert_eq!(blender.state(49, None), BlendState::InsufficientData);
    }
}
