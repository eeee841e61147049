//! Telemetry records - one sampled driving instant
//!
//! Records are produced by the ingestion collaborator and only read here.
//! A telemetry window is an ordered slice of records for one subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-axis acceleration sample (g)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Harsh-event flags raised by the device for a sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrivingEvents {
    pub harsh_braking: bool,
    pub harsh_acceleration: bool,
    pub harsh_turning: bool,
    pub phone_usage: bool,
}

impl DrivingEvents {
    /// Number of harsh manoeuvre flags set (phone usage excluded)
    pub fn harsh_count(&self) -> usize {
        [self.harsh_braking, self.harsh_acceleration, self.harsh_turning]
            .iter()
            .filter(|flag| **flag)
            .count()
    }

    /// Whether any harsh manoeuvre flag is set
    pub fn any_harsh(&self) -> bool {
        self.harsh_count() > 0
    }
}

/// Road category the sample was taken on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadType {
    Highway,
    City,
    Rural,
    Residential,
    Parking,
    #[serde(other)]
    Unknown,
}

impl Default for RoadType {
    fn default() -> Self {
        RoadType::Unknown
    }
}

/// Weather conditions at sample time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub condition: String,
    /// Degrees Celsius
    pub temperature: f64,
    /// Kilometres
    pub visibility: f64,
    /// Road risk in [0, 1]
    pub road_risk: f64,
}

/// One sampled driving instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    /// Speed in mph
    pub speed: f64,
    #[serde(default)]
    pub acceleration: Acceleration,
    #[serde(default)]
    pub events: DrivingEvents,
    /// Groups temporally contiguous records into a trip
    pub trip_id: String,
    #[serde(default)]
    pub road_type: RoadType,
    #[serde(default)]
    pub weather: Option<WeatherSnapshot>,
}

impl TelemetryRecord {
    /// Create a record with no events, unknown road type and no weather
    pub fn new(timestamp: DateTime<Utc>, speed: f64, trip_id: impl Into<String>) -> Self {
        Self {
            timestamp,
            speed,
            acceleration: Acceleration::default(),
            events: DrivingEvents::default(),
            trip_id: trip_id.into(),
            road_type: RoadType::Unknown,
            weather: None,
        }
    }

    /// Set the harsh-event flags
    pub fn with_events(mut self, events: DrivingEvents) -> Self {
        self.events = events;
        self
    }

    /// Set the road type
    pub fn with_road_type(mut self, road_type: RoadType) -> Self {
        self.road_type = road_type;
        self
    }

    /// Attach a weather snapshot
    pub fn with_weather(mut self, weather: WeatherSnapshot) -> Self {
        self.weather = Some(weather);
        self
    }

    /// Road risk of the attached weather snapshot, if any
    pub fn road_risk(&self) -> Option<f64> {
        self.weather.as_ref().map(|w| w.road_risk)
    }
}
