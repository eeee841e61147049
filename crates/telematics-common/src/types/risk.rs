//! Risk types - factors, score results and score queries
//!
//! A [`ScoreResult`] is the value handed to pricing. Its `method` tells which
//! sub-scores are populated:
//! - `ml_enhanced`: traditional and ML sub-scores
//! - `traditional` / `traditional_fallback`: traditional sub-score only
//! - `insufficient_data`: neither

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Neutral prior used when nothing is known about a driver
pub const NEUTRAL_RISK_SCORE: u8 = 50;

/// Longest lookback a score query may ask for (100 years)
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Round a raw score and clamp it into [0, 100]
pub fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return NEUTRAL_RISK_SCORE;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Named risk factor produced by factor analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FactorKind {
    SpeedViolations,
    HarshEvents,
    Mileage,
    TimeOfDay,
    WeatherRisk,
    LocationRisk,
    PhoneUsage,
}

impl FactorKind {
    /// All factors in composite order
    pub const ALL: [FactorKind; 7] = [
        FactorKind::SpeedViolations,
        FactorKind::HarshEvents,
        FactorKind::Mileage,
        FactorKind::TimeOfDay,
        FactorKind::WeatherRisk,
        FactorKind::LocationRisk,
        FactorKind::PhoneUsage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactorKind::SpeedViolations => "speedViolations",
            FactorKind::HarshEvents => "harshEvents",
            FactorKind::Mileage => "mileage",
            FactorKind::TimeOfDay => "timeOfDay",
            FactorKind::WeatherRisk => "weatherRisk",
            FactorKind::LocationRisk => "locationRisk",
            FactorKind::PhoneUsage => "phoneUsage",
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analysed factor: rate (share of records, harsh events may exceed 1),
/// score (may exceed 100) and raw statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub rate: f64,
    pub score: f64,
    /// Raw statistics behind the rate (counts, averages, distances)
    #[serde(flatten)]
    pub stats: BTreeMap<String, f64>,
}

impl FactorScore {
    pub fn new(rate: f64, score: f64) -> Self {
        Self {
            rate,
            score,
            stats: BTreeMap::new(),
        }
    }

    /// Attach a raw statistic
    pub fn with_stat(mut self, name: &str, value: f64) -> Self {
        self.stats.insert(name.to_string(), value);
        self
    }

    /// Look up a raw statistic
    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied()
    }
}

/// Mapping from factor name to analysed factor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskFactors(BTreeMap<FactorKind, FactorScore>);

impl RiskFactors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: FactorKind, factor: FactorScore) {
        self.0.insert(kind, factor);
    }

    pub fn get(&self, kind: FactorKind) -> Option<&FactorScore> {
        self.0.get(&kind)
    }

    /// Empty factors mark the neutral prior rather than a computed score
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FactorKind, &FactorScore)> {
        self.0.iter()
    }
}

impl FromIterator<(FactorKind, FactorScore)> for RiskFactors {
    fn from_iter<I: IntoIterator<Item = (FactorKind, FactorScore)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How a risk score was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    /// Rule-based score only, no ML stage attempted
    Traditional,
    /// Confidence-weighted blend of ML and traditional scores
    MlEnhanced,
    /// ML unavailable or not confident enough
    TraditionalFallback,
    /// Too few records to score
    InsufficientData,
}

impl ScoringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMethod::Traditional => "traditional",
            ScoringMethod::MlEnhanced => "ml_enhanced",
            ScoringMethod::TraditionalFallback => "traditional_fallback",
            ScoringMethod::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data quality summary attached to every score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub total_data_points: usize,
    /// Lookback window the score covers
    pub time_span_days: u32,
    pub sufficient_data: bool,
}

/// Final scoring output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Risk score 0-100, lower is safer
    pub risk_score: u8,
    pub method: ScoringMethod,
    /// Confidence in [0, 1]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traditional_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_score: Option<f64>,
    pub factors: RiskFactors,
    pub data_quality: DataQuality,
    pub generated_at: DateTime<Utc>,
}

impl ScoreResult {
    /// Whether an ML prediction contributed to this score
    pub fn is_ml_enhanced(&self) -> bool {
        self.method == ScoringMethod::MlEnhanced
    }
}

/// Score request from the surrounding API layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreQuery {
    pub subject_id: String,
    pub window_days: i64,
}

impl ScoreQuery {
    pub fn new(subject_id: impl Into<String>, window_days: i64) -> Self {
        Self {
            subject_id: subject_id.into(),
            window_days,
        }
    }

    /// Validate the request shape, returning the window in days
    pub fn validate(&self) -> Result<u32, RequestError> {
        if self.subject_id.trim().is_empty() {
            return Err(RequestError::EmptySubject);
        }
        if self.window_days <= 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(RequestError::InvalidWindow(self.window_days));
        }
        Ok(self.window_days as u32)
    }
}
