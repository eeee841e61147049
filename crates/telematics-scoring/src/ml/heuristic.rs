//! In-process heuristic predictor
//!
//! A hand-tuned stand-in for a trained model, used when no external
//! predictor is configured. Penalties are additive, then scaled by a data
//! quality factor, then adjusted for feature interactions.

use async_trait::async_trait;

use super::features::MlFeatures;
use super::predictor::{MlPrediction, Prediction, RiskPredictor};

const BASE_SCORE: f64 = 25.0;
const BASE_CONFIDENCE: f64 = 0.6;

/// Deterministic heuristic model
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPredictor;

impl HeuristicPredictor {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the model synchronously
    pub fn evaluate(&self, features: &MlFeatures) -> MlPrediction {
        let mut score = BASE_SCORE;

        if features.avg_speed > 60.0 {
            score += (features.avg_speed - 60.0) * 1.2;
        } else if features.avg_speed > 50.0 {
            score += (features.avg_speed - 50.0) * 0.8;
        }
        if features.max_speed > 80.0 {
            score += (features.max_speed - 80.0) * 0.5;
        }

        score += features.harsh_braking_rate * 200.0;
        score += features.harsh_accel_rate * 180.0;
        score += features.phone_usage_rate * 300.0;
        score += features.speeding_rate * 150.0;
        score += features.night_driving_rate * 40.0;
        score += features.bad_weather_rate * 60.0;

        let data_quality = (features.data_points as f64 / 500.0).min(1.0);
        let trip_quality = (features.total_trips as f64 / 50.0).min(1.0);
        let confidence = BASE_CONFIDENCE + data_quality * 0.2 + trip_quality * 0.2;

        score *= 0.7 + 0.3 * data_quality;

        if features.harsh_braking_rate > 0.05 && features.avg_speed > 55.0 {
            score += 15.0;
        }
        if features.phone_usage_rate > 0.03 && features.night_driving_rate > 0.15 {
            score += 20.0;
        }

        let risk_score = round_to(score.clamp(5.0, 95.0), 2);
        let confidence = round_to(confidence.clamp(0.5, 1.0), 3);

        MlPrediction {
            risk_score,
            confidence,
            risk_level: Some(risk_level(risk_score)),
        }
    }
}

/// Risk band: 0 low, 1 medium, 2 high, 3 very high
pub fn risk_level(risk_score: f64) -> u8 {
    match risk_score {
        s if s <= 30.0 => 0,
        s if s <= 50.0 => 1,
        s if s <= 70.0 => 2,
        _ => 3,
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[async_trait]
impl RiskPredictor for HeuristicPredictor {
    async fn predict(&self, features: &MlFeatures) -> Prediction {
        Prediction::Available(self.evaluate(features))
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> MlFeatures {
        MlFeatures {
            avg_speed: 40.0,
            max_speed: 60.0,
            speed_variance: 20.0,
            speeding_rate: 0.0,
            harsh_braking_rate: 0.0,
            harsh_accel_rate: 0.0,
            harsh_turning_rate: 0.0,
            phone_usage_rate: 0.0,
            night_driving_rate: 0.0,
            weekend_driving_rate: 0.0,
            total_trips: 50,
            avg_trip_length: 10.0,
            bad_weather_rate: 0.0,
            data_points: 500,
            time_span_days: 30,
        }
    }

    #[test]
    fn test_calm_driver_gets_base_score() {
        let prediction = HeuristicPredictor.evaluate(&calm());
        assert_eq!(prediction.risk_score, 25.0);
        assert_eq!(prediction.confidence, 1.0);
        assert_eq!(prediction.risk_level, Some(0));
    }

    #[test]
    fn test_small_sample_scales_down() {
        let features = MlFeatures {
            data_points: 100,
            total_trips: 5,
            ..calm()
        };
        let prediction = HeuristicPredictor.evaluate(&features);
        // 25 × (0.7 + 0.3 × 0.2)
        assert_eq!(prediction.risk_score, 19.0);
        // 0.6 + 0.2 × 0.2 + 0.2 × 0.1
        assert_eq!(prediction.confidence, 0.66);
    }

    #[test]
    fn test_interactions_and_clamp() {
        let risky = MlFeatures {
            avg_speed: 75.0,
            max_speed: 110.0,
            harsh_braking_rate: 0.1,
            phone_usage_rate: 0.1,
            night_driving_rate: 0.5,
            ..calm()
        };
        let prediction = HeuristicPredictor.evaluate(&risky);
        assert_eq!(prediction.risk_score, 95.0);
        assert_eq!(prediction.risk_level, Some(3));
    }

    #[test]
    fn test_risk_levels() {
        assert_eq!(risk_level(30.0), 0);
        assert_eq!(risk_level(30.01), 1);
        assert_eq!(risk_level(50.0), 1);
        assert_eq!(risk_level(70.0), 2);
        assert_eq!(risk_level(70.5), 3);
    }

    #[tokio::test]
    async fn test_always_available() {
        let prediction = HeuristicPredictor.predict(&calm()).await;
        assert!(prediction.available().is_some());
    }
}
