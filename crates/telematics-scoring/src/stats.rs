//! Descriptive driving statistics for dashboards

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use telematics_common::TelemetryRecord;

use crate::factors::{estimate_distance, FactorConfig};

/// Aggregate driving statistics for one window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivingStats {
    /// Miles, one decimal place
    pub total_distance: f64,
    /// Mean of non-zero speeds, rounded to whole mph
    pub avg_speed: f64,
    pub harsh_events: usize,
    /// Share of records in the night window, 0-100, rounded
    pub night_driving_pct: f64,
    pub total_trips: usize,
    /// Trips started per weekday, Sunday first
    pub weekly_pattern: [usize; 7],
    /// Records per UTC hour
    pub hourly_pattern: [usize; 24],
    pub data_points: usize,
}

impl DrivingStats {
    /// Compute statistics; an empty window yields all zeros
    pub fn from_records(records: &[TelemetryRecord], config: &FactorConfig) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let moving: Vec<f64> = records
            .iter()
            .map(|r| r.speed)
            .filter(|speed| *speed > 0.0)
            .collect();
        let avg_speed = if moving.is_empty() {
            0.0
        } else {
            (moving.iter().sum::<f64>() / moving.len() as f64).round()
        };

        let harsh_events = records.iter().filter(|r| r.events.any_harsh()).count();
        let night = records
            .iter()
            .filter(|r| config.is_night(r.timestamp.hour()))
            .count();

        let mut trip_starts: HashMap<&str, DateTime<Utc>> = HashMap::new();
        let mut hourly_pattern = [0usize; 24];
        for record in records {
            hourly_pattern[record.timestamp.hour() as usize] += 1;
            trip_starts
                .entry(record.trip_id.as_str())
                .and_modify(|start| *start = (*start).min(record.timestamp))
                .or_insert(record.timestamp);
        }

        let mut weekly_pattern = [0usize; 7];
        for start in trip_starts.values() {
            weekly_pattern[start.weekday().num_days_from_sunday() as usize] += 1;
        }

        Self {
            total_distance: (estimate_distance(records) * 10.0).round() / 10.0,
            avg_speed,
            harsh_events,
            night_driving_pct: (night as f64 / records.len() as f64 * 100.0).round(),
            total_trips: trip_starts.len(),
            weekly_pattern,
            hourly_pattern,
            data_points: records.len(),
        }
    }
}
