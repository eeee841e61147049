//! Numeric feature vector for the ML predictor
//!
//! Field names are the predictor's wire contract and must not change.

use std::collections::HashSet;

use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use telematics_common::{AnalysisError, TelemetryRecord, ML_MIN_SAMPLES};

/// Feature vector sent to the predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlFeatures {
    pub avg_speed: f64,
    pub max_speed: f64,
    /// Population variance of speed
    pub speed_variance: f64,
    pub speeding_rate: f64,
    pub harsh_braking_rate: f64,
    pub harsh_accel_rate: f64,
    pub harsh_turning_rate: f64,
    pub phone_usage_rate: f64,
    pub night_driving_rate: f64,
    pub weekend_driving_rate: f64,
    pub total_trips: usize,
    /// Records per trip
    pub avg_trip_length: f64,
    pub bad_weather_rate: f64,
    pub data_points: usize,
    /// Whole days between the oldest and newest record, rounded up
    pub time_span_days: u32,
}

/// Feature extraction thresholds
#[derive(Debug, Clone)]
pub struct MlFeatureExtractor {
    min_samples: usize,
    speeding_threshold_mph: f64,
    bad_weather_threshold: f64,
}

impl Default for MlFeatureExtractor {
    fn default() -> Self {
        Self {
            min_samples: ML_MIN_SAMPLES,
            speeding_threshold_mph: 70.0,
            bad_weather_threshold: 0.5,
        }
    }
}

impl MlFeatureExtractor {
    pub fn new(min_samples: usize) -> Self {
        Self {
            min_samples,
            ..Default::default()
        }
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Extract features, refusing windows below the sample floor
    pub fn extract(&self, records: &[TelemetryRecord]) -> Result<MlFeatures, AnalysisError> {
        let n = records.len();
        if n == 0 {
            return Err(AnalysisError::EmptyInput);
        }
        if n < self.min_samples {
            return Err(AnalysisError::InsufficientData {
                count: n,
                required: self.min_samples,
            });
        }

        let total = n as f64;

        let avg_speed = records.iter().map(|r| r.speed).sum::<f64>() / total;
        let max_speed = records.iter().map(|r| r.speed).fold(f64::MIN, f64::max);
        let speed_variance = records
            .iter()
            .map(|r| (r.speed - avg_speed).powi(2))
            .sum::<f64>()
            / total;

        let total_trips = records
            .iter()
            .map(|r| r.trip_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let oldest = records.iter().map(|r| r.timestamp).min();
        let newest = records.iter().map(|r| r.timestamp).max();
        let time_span_days = match (oldest, newest) {
            (Some(oldest), Some(newest)) => {
                let days = (newest - oldest).num_milliseconds() as f64 / 86_400_000.0;
                days.ceil() as u32
            }
            _ => 0,
        };

        Ok(MlFeatures {
            avg_speed,
            max_speed,
            speed_variance,
            speeding_rate: share(records, |r| r.speed > self.speeding_threshold_mph),
            harsh_braking_rate: share(records, |r| r.events.harsh_braking),
            harsh_accel_rate: share(records, |r| r.events.harsh_acceleration),
            harsh_turning_rate: share(records, |r| r.events.harsh_turning),
            phone_usage_rate: share(records, |r| r.events.phone_usage),
            night_driving_rate: share(records, |r| {
                let hour = r.timestamp.hour();
                hour < 6 || hour > 22
            }),
            weekend_driving_rate: share(records, |r| {
                matches!(r.timestamp.weekday(), Weekday::Sat | Weekday::Sun)
            }),
            total_trips,
            avg_trip_length: total / total_trips.max(1) as f64,
            bad_weather_rate: share(records, |r| {
                r.road_risk()
                    .is_some_and(|risk| risk > self.bad_weather_threshold)
            }),
            data_points: n,
            time_span_days,
        })
    }
}

fn share(records: &[TelemetryRecord], predicate: impl Fn(&TelemetryRecord) -> bool) -> f64 {
    records.iter().filter(|r| predicate(r)).count() as f64 / records.len() as f64
}
