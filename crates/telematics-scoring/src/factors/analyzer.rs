//! Per-factor statistics over a telemetry window
//!
//! Every function here is pure and deterministic for a given slice. Factor
//! scores are not clamped unless the rule says so; weighting and clamping
//! happen in the traditional scorer.

use chrono::Timelike;
use telematics_common::{
    AnalysisError, FactorKind, FactorScore, RiskFactors, RoadType, TelemetryRecord,
};

use super::FactorConfig;

/// Factor analyzer with configurable business parameters
#[derive(Debug, Clone, Default)]
pub struct FactorAnalyzer {
    config: FactorConfig,
}

impl FactorAnalyzer {
    pub fn new(config: FactorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FactorConfig {
        &self.config
    }

    /// Analyze all factors for a non-empty window
    pub fn analyze(&self, records: &[TelemetryRecord]) -> Result<RiskFactors, AnalysisError> {
        if records.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        Ok(RiskFactors::from_iter([
            (FactorKind::SpeedViolations, self.speed_violations(records)),
            (FactorKind::HarshEvents, self.harsh_events(records)),
            (FactorKind::Mileage, self.mileage(records)),
            (FactorKind::TimeOfDay, self.time_of_day(records)),
            (FactorKind::WeatherRisk, self.weather_risk(records)),
            (FactorKind::LocationRisk, self.location_risk(records)),
            (FactorKind::PhoneUsage, self.phone_usage(records)),
        ]))
    }

    /// score = min(rate × 100 + meanExcess × 2, 100)
    pub fn speed_violations(&self, records: &[TelemetryRecord]) -> FactorScore {
        let limit = self.config.speed_limit_mph;
        let excesses: Vec<f64> = records
            .iter()
            .filter(|r| r.speed > limit)
            .map(|r| r.speed - limit)
            .collect();

        let rate = ratio(excesses.len(), records.len());
        let avg_excess = if excesses.is_empty() {
            0.0
        } else {
            excesses.iter().sum::<f64>() / excesses.len() as f64
        };

        FactorScore::new(rate, (rate * 100.0 + avg_excess * 2.0).min(100.0))
            .with_stat("violations", excesses.len() as f64)
            .with_stat("avgExcess", avg_excess)
    }

    /// score = min(rate × 1000, 100) where rate counts every harsh flag
    pub fn harsh_events(&self, records: &[TelemetryRecord]) -> FactorScore {
        let braking = records.iter().filter(|r| r.events.harsh_braking).count();
        let acceleration = records.iter().filter(|r| r.events.harsh_acceleration).count();
        let turning = records.iter().filter(|r| r.events.harsh_turning).count();

        let rate = ratio(braking + acceleration + turning, records.len());

        FactorScore::new(rate, (rate * 1000.0).min(100.0))
            .with_stat("harshBraking", braking as f64)
            .with_stat("harshAcceleration", acceleration as f64)
            .with_stat("harshTurning", turning as f64)
    }

    /// score = min(dailyMiles / saturation × 100, 100)
    pub fn mileage(&self, records: &[TelemetryRecord]) -> FactorScore {
        let total_distance = estimate_distance(records);
        let daily_mileage = total_distance / self.config.mileage_basis_days;
        let utilisation = daily_mileage / self.config.daily_miles_saturation;

        FactorScore::new(utilisation.min(1.0), (utilisation * 100.0).min(100.0))
            .with_stat("totalDistance", total_distance)
            .with_stat("dailyMileage", daily_mileage)
    }

    /// score = nightRate × 50
    pub fn time_of_day(&self, records: &[TelemetryRecord]) -> FactorScore {
        let night = records
            .iter()
            .filter(|r| self.config.is_night(r.timestamp.hour()))
            .count();
        let rate = ratio(night, records.len());

        FactorScore::new(rate, rate * 50.0).with_stat("nightRecords", night as f64)
    }

    /// score = highRiskRate × 30
    pub fn weather_risk(&self, records: &[TelemetryRecord]) -> FactorScore {
        let threshold = self.config.weather_risk_threshold;
        let high_risk = records
            .iter()
            .filter(|r| r.road_risk().is_some_and(|risk| risk > threshold))
            .count();
        let rate = ratio(high_risk, records.len());

        FactorScore::new(rate, rate * 30.0).with_stat("highRiskRecords", high_risk as f64)
    }

    /// score = cityRate × 20 + highwayRate × 10
    pub fn location_risk(&self, records: &[TelemetryRecord]) -> FactorScore {
        let city = records.iter().filter(|r| r.road_type == RoadType::City).count();
        let highway = records
            .iter()
            .filter(|r| r.road_type == RoadType::Highway)
            .count();
        let city_rate = ratio(city, records.len());
        let highway_rate = ratio(highway, records.len());

        FactorScore::new(city_rate + highway_rate, city_rate * 20.0 + highway_rate * 10.0)
            .with_stat("cityRate", city_rate)
            .with_stat("highwayRate", highway_rate)
    }

    /// score = rate × 200, uncapped
    pub fn phone_usage(&self, records: &[TelemetryRecord]) -> FactorScore {
        let events = records.iter().filter(|r| r.events.phone_usage).count();
        let rate = ratio(events, records.len());

        FactorScore::new(rate, rate * 200.0).with_stat("events", events as f64)
    }
}

/// Estimated distance in miles: average adjacent speed × |Δt| in hours
pub fn estimate_distance(records: &[TelemetryRecord]) -> f64 {
    records
        .windows(2)
        .map(|pair| {
            let hours = (pair[1].timestamp - pair[0].timestamp).num_milliseconds().abs() as f64
                / 3_600_000.0;
            (pair[0].speed + pair[1].speed) / 2.0 * hours
        })
        .sum()
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
