//! Weekly risk trend
//!
//! Week `w` (0 = most recent) is scored over the cumulative lookback
//! `min(days - 7w, 7) + 7w`, so each point covers everything from the start
//! of that week up to now. Points are returned oldest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use telematics_common::ScoringMethod;

/// Hard cap on trend length
pub const MAX_TREND_WEEKS: u32 = 26;

/// One weekly trend point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// 1-based week label, oldest lowest
    pub week: u32,
    /// Lookback the point was scored over
    pub window_days: u32,
    pub risk_score: u8,
    pub method: ScoringMethod,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traditional_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_score: Option<f64>,
}

/// Weekly trend over a lookback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskTrend {
    pub window_days: u32,
    pub points: Vec<TrendPoint>,
    pub generated_at: DateTime<Utc>,
}

/// Week label and cumulative lookback per trend point, most recent first
pub fn trend_windows(window_days: u32, max_weeks: u32) -> Vec<(u32, u32)> {
    let weeks = window_days.div_ceil(7);
    (0..weeks.min(max_weeks))
        .map_while(|week| {
            let remaining = window_days.checked_sub(week * 7).filter(|days| *days > 0)?;
            Some((weeks - week, remaining.min(7) + week * 7))
        })
        .collect()
}
