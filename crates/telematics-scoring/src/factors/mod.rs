//! Factor analysis module
//!
//! Turns a telemetry window into named risk factors:
//! - Speed violations against a fixed limit
//! - Harsh braking / acceleration / turning rate
//! - Estimated mileage (trapezoidal integration)
//! - Night driving share
//! - High-risk weather share
//! - City / highway share
//! - Phone usage rate

pub mod analyzer;

use serde::{Deserialize, Serialize};
use telematics_common::DEFAULT_SPEED_LIMIT_MPH;

pub use analyzer::{estimate_distance, FactorAnalyzer};

/// Business parameters for factor analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorConfig {
    /// Speed above which a record counts as a violation (mph)
    pub speed_limit_mph: f64,
    /// First night hour (inclusive, UTC)
    pub night_start_hour: u32,
    /// First day hour after the night window (exclusive, UTC)
    pub night_end_hour: u32,
    /// Road risk above which weather counts as high risk
    pub weather_risk_threshold: f64,
    /// Days the estimated distance is spread over
    pub mileage_basis_days: f64,
    /// Daily miles that saturate the mileage score
    pub daily_miles_saturation: f64,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            speed_limit_mph: DEFAULT_SPEED_LIMIT_MPH,
            night_start_hour: 22,
            night_end_hour: 6,
            weather_risk_threshold: 0.7,
            mileage_basis_days: 30.0,
            daily_miles_saturation: 50.0,
        }
    }
}

impl FactorConfig {
    /// Whether an hour of day falls in the night window
    pub fn is_night(&self, hour: u32) -> bool {
        if self.night_start_hour > self.night_end_hour {
            hour >= self.night_start_hour || hour < self.night_end_hour
        } else {
            hour >= self.night_start_hour && hour < self.night_end_hour
        }
    }
}
