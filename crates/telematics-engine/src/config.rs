//! Engine configuration

use std::time::Duration;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use telematics_pricing::PricingConfig;
use telematics_scoring::ScoringConfig;

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// External ML predictor settings
    pub predictor: PredictorSettings,
    pub scoring: ScoringConfig,
    pub pricing: PricingConfig,
}

/// ML predictor settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictorSettings {
    /// Program invoked with the feature JSON as its last argument.
    /// The in-process heuristic predictor is used when unset.
    pub command: Option<String>,
    /// Arguments placed before the feature JSON
    pub args: Vec<String>,
    /// Disable the ML stage entirely
    pub disabled: bool,
}

impl EngineConfig {
    /// Load configuration from `.env` and `TELEMATICS_*` environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup on top of the defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();

        // Predictor settings
        if let Some(command) = lookup("TELEMATICS_PREDICTOR_COMMAND").filter(|c| !c.trim().is_empty()) {
            cfg.predictor.command = Some(command);
        }
        if let Some(args) = lookup("TELEMATICS_PREDICTOR_ARGS") {
            cfg.predictor.args = args.split_whitespace().map(str::to_string).collect();
        }
        if let Some(val) = lookup("TELEMATICS_PREDICTOR_DISABLED") {
            cfg.predictor.disabled = parse(&val, "TELEMATICS_PREDICTOR_DISABLED")?;
        }
        if let Some(val) = lookup("TELEMATICS_PREDICTOR_TIMEOUT_MS") {
            cfg.scoring.ml_timeout_ms = parse(&val, "TELEMATICS_PREDICTOR_TIMEOUT_MS")?;
        }

        // Scoring settings
        if let Some(val) = lookup("TELEMATICS_SPEED_LIMIT") {
            cfg.scoring.factors.speed_limit_mph = parse(&val, "TELEMATICS_SPEED_LIMIT")?;
        }
        if let Some(val) = lookup("TELEMATICS_ML_MIN_SAMPLES") {
            cfg.scoring.blend.min_samples = parse(&val, "TELEMATICS_ML_MIN_SAMPLES")?;
        }
        if let Some(val) = lookup("TELEMATICS_ML_CONFIDENCE_THRESHOLD") {
            cfg.scoring.blend.confidence_threshold =
                parse(&val, "TELEMATICS_ML_CONFIDENCE_THRESHOLD")?;
        }

        // Pricing settings
        if let Some(val) = lookup("TELEMATICS_COMPARISON_THRESHOLD") {
            cfg.pricing.comparison_threshold =
                parse::<Decimal>(&val, "TELEMATICS_COMPARISON_THRESHOLD")?;
        }

        Ok(cfg)
    }

    pub fn predictor_timeout(&self) -> Duration {
        self.scoring.ml_timeout()
    }
}

fn parse<T>(value: &str, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid value {:?} for {}", value, key))
}
