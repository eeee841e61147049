//! Rule-based composite scoring
//!
//! Weighted sum of factor scores, rounded and clamped to [0, 100].
//! An empty window yields the neutral prior with no factors.

use serde::{Deserialize, Serialize};
use telematics_common::{clamp_score, FactorKind, RiskFactors, TelemetryRecord, NEUTRAL_RISK_SCORE};
use tracing::debug;

use crate::factors::{FactorAnalyzer, FactorConfig};

/// Composite weights per factor, summing to 1.0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorWeights {
    pub speed_violations: f64,
    pub harsh_events: f64,
    pub mileage: f64,
    pub time_of_day: f64,
    pub weather_risk: f64,
    pub location_risk: f64,
    pub phone_usage: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            speed_violations: 0.25,
            harsh_events: 0.20,
            mileage: 0.15,
            time_of_day: 0.10,
            weather_risk: 0.10,
            location_risk: 0.10,
            phone_usage: 0.10,
        }
    }
}

impl FactorWeights {
    pub fn weight(&self, kind: FactorKind) -> f64 {
        match kind {
            FactorKind::SpeedViolations => self.speed_violations,
            FactorKind::HarshEvents => self.harsh_events,
            FactorKind::Mileage => self.mileage,
            FactorKind::TimeOfDay => self.time_of_day,
            FactorKind::WeatherRisk => self.weather_risk,
            FactorKind::LocationRisk => self.location_risk,
            FactorKind::PhoneUsage => self.phone_usage,
        }
    }

    pub fn total(&self) -> f64 {
        FactorKind::ALL.iter().map(|kind| self.weight(*kind)).sum()
    }
}

/// Traditional score for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraditionalScore {
    pub risk_score: u8,
    pub factors: RiskFactors,
}

impl TraditionalScore {
    /// Neutral prior: score 50, no factors
    pub fn neutral() -> Self {
        Self {
            risk_score: NEUTRAL_RISK_SCORE,
            factors: RiskFactors::new(),
        }
    }
}

/// Rule-based scorer over factor analysis
#[derive(Debug, Clone, Default)]
pub struct TraditionalScorer {
    analyzer: FactorAnalyzer,
    weights: FactorWeights,
}

impl TraditionalScorer {
    pub fn new(config: FactorConfig, weights: FactorWeights) -> Self {
        Self {
            analyzer: FactorAnalyzer::new(config),
            weights,
        }
    }

    pub fn analyzer(&self) -> &FactorAnalyzer {
        &self.analyzer
    }

    /// Score a window
    pub fn score(&self, records: &[TelemetryRecord]) -> TraditionalScore {
        let factors = match self.analyzer.analyze(records) {
            Ok(factors) => factors,
            Err(e) => {
                debug!(error = %e, "No factors, using neutral prior");
                return TraditionalScore::neutral();
            }
        };

        let composite = self.composite(&factors);
        TraditionalScore {
            risk_score: clamp_score(composite),
            factors,
        }
    }

    /// Unclamped weighted sum of the factors present
    pub fn composite(&self, factors: &RiskFactors) -> f64 {
        factors
            .iter()
            .map(|(kind, factor)| factor.score * self.weights.weight(*kind))
            .sum()
    }
}
