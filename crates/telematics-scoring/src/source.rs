//! In-memory telemetry source
//!
//! Holds records per subject and serves lookback windows relative to a
//! reference time. Used by the engine CLI and by tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use telematics_common::{Result, TelematicsError, TelemetryRecord, TelemetrySource};
use tracing::debug;

/// Telemetry held in memory, keyed by subject
#[derive(Default)]
pub struct InMemoryTelemetrySource {
    records: DashMap<String, Vec<TelemetryRecord>>,
    reference_time: Option<DateTime<Utc>>,
}

impl InMemoryTelemetrySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor windows at a fixed instant instead of the wall clock
    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    /// Append records for a subject, keeping them ordered by timestamp
    pub fn insert(&self, subject_id: impl Into<String>, records: impl IntoIterator<Item = TelemetryRecord>) {
        let mut entry = self.records.entry(subject_id.into()).or_default();
        entry.extend(records);
        entry.sort_by_key(|r| r.timestamp);
    }

    pub fn subject_count(&self) -> usize {
        self.records.len()
    }

    fn now(&self) -> DateTime<Utc> {
        self.reference_time.unwrap_or_else(Utc::now)
    }
}

#[async_trait]
impl TelemetrySource for InMemoryTelemetrySource {
    async fn window(&self, subject_id: &str, window_days: u32) -> Result<Vec<TelemetryRecord>> {
        let now = self.now();
        let since = Duration::try_days(i64::from(window_days))
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .ok_or_else(|| {
                TelematicsError::Telemetry(format!("window of {} days is out of range", window_days))
            })?;

        let records: Vec<TelemetryRecord> = self
            .records
            .get(subject_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.timestamp >= since && r.timestamp <= now)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(subject_id, window_days, count = records.len(), "Loaded telemetry window");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_window_filters_and_orders() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let source = InMemoryTelemetrySource::new().with_reference_time(now);
        source.insert(
            "u1",
            vec![
                TelemetryRecord::new(now - Duration::days(2), 30.0, "b"),
                TelemetryRecord::new(now - Duration::days(10), 30.0, "a"),
                TelemetryRecord::new(now - Duration::hours(1), 30.0, "c"),
                TelemetryRecord::new(now + Duration::hours(1), 30.0, "future"),
            ],
        );

        let window = source.window("u1", 7).await.unwrap();
        let trips: Vec<&str> = window.iter().map(|r| r.trip_id.as_str()).collect();
        assert_eq!(trips, vec!["b", "c"]);

        assert!(source.window("nobody", 7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_window_past_calendar_range_is_an_error() {
        let source = InMemoryTelemetrySource::new();
        source.insert("u1", vec![TelemetryRecord::new(Utc::now(), 30.0, "a")]);

        let err = source.window("u1", u32::MAX).await.unwrap_err();
        assert!(matches!(err, TelematicsError::Telemetry(_)));
    }
}
