//! # Telematics Common
//!
//! Shared types, errors, and collaborator traits for the telematics risk
//! scoring and premium pricing core.
//!
//! ## Core Types
//!
//! - [`TelemetryRecord`]: one sampled driving instant
//! - [`RiskFactors`]: named factor analysis output
//! - [`ScoreResult`]: blended 0-100 risk score with method and confidence
//! - [`PricingQuote`]: monthly premium with multipliers and breakdown
//!
//! ## Collaborators
//!
//! - [`TelemetrySource`]: telemetry window supplier
//! - [`ScoreProvider`]: read-only score access used by pricing
//! - [`DemographicProvider`]: policyholder demographics lookup

pub mod error;
pub mod providers;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{AnalysisError, DemographicError, RequestError, Result, TelematicsError};
pub use providers::{DemographicProvider, ScoreProvider, TelemetrySource};
pub use types::{
    quote::{CoverageType, DemographicProfile, PremiumBreakdown, PricingQuote, UsageProfile},
    risk::{
        clamp_score, DataQuality, FactorKind, FactorScore, RiskFactors, ScoreQuery, ScoreResult,
        ScoringMethod, MAX_WINDOW_DAYS, NEUTRAL_RISK_SCORE,
    },
    telemetry::{Acceleration, DrivingEvents, RoadType, TelemetryRecord, WeatherSnapshot},
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum records before the ML stage is attempted
pub const ML_MIN_SAMPLES: usize = 50;

/// Records at which a window counts as sufficient data
pub const SUFFICIENT_DATA_POINTS: usize = 100;

/// Default speed limit for violation analysis (mph)
pub const DEFAULT_SPEED_LIMIT_MPH: f64 = 65.0;

/// Ceiling on the ML share of a blended score
pub const MAX_BLEND_WEIGHT: f64 = 0.8;

/// Minimum ML confidence for blending
pub const ML_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Confidence reported for traditional scores
pub const TRADITIONAL_CONFIDENCE: f64 = 0.9;
