//! Premium calculator
//!
//! Pure and deterministic apart from the quote id and timestamp. Multipliers
//! and breakdown steps keep full decimal precision; the final premium and
//! savings are rounded to cents, half away from zero.

use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use telematics_common::{
    CoverageType, DemographicProfile, PremiumBreakdown, PricingQuote, ScoreResult, ScoringMethod,
    UsageProfile,
};
use tracing::debug;
use uuid::Uuid;

use crate::demographics;
use crate::PricingConfig;

/// ML confidence above which the ML bonus discount applies
const ML_BONUS_CONFIDENCE: f64 = 0.85;

/// Everything the calculator needs for one quote
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteInput {
    pub coverage_type: CoverageType,
    pub risk_score: u8,
    pub scoring_method: ScoringMethod,
    pub confidence: f64,
    pub demographic_multiplier: Decimal,
    pub usage: UsageProfile,
}

impl QuoteInput {
    pub fn new(
        coverage_type: CoverageType,
        risk_score: u8,
        scoring_method: ScoringMethod,
        confidence: f64,
    ) -> Self {
        Self {
            coverage_type,
            risk_score,
            scoring_method,
            confidence,
            demographic_multiplier: Decimal::ONE,
            usage: UsageProfile::default(),
        }
    }

    pub fn from_score(coverage_type: CoverageType, score: &ScoreResult) -> Self {
        Self::new(coverage_type, score.risk_score, score.method, score.confidence)
    }

    pub fn with_demographic_multiplier(mut self, multiplier: Decimal) -> Self {
        self.demographic_multiplier = multiplier;
        self
    }

    pub fn with_usage(mut self, usage: UsageProfile) -> Self {
        self.usage = usage;
        self
    }
}

/// Multi-factor premium calculator
#[derive(Debug, Clone, Default)]
pub struct PricingCalculator {
    config: PricingConfig,
}

impl PricingCalculator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn base_premium(&self, coverage_type: CoverageType) -> Decimal {
        self.config.base_premiums.for_coverage(coverage_type)
    }

    /// Step function of the risk score, boundaries inclusive on the lower score
    pub fn risk_multiplier(&self, risk_score: u8) -> Decimal {
        match risk_score {
            0..=20 => dec!(0.75),
            21..=40 => dec!(0.90),
            41..=60 => dec!(1.00),
            61..=80 => dec!(1.25),
            _ => dec!(1.50),
        }
    }

    /// Tiered discount plus the confident-ML bonus
    pub fn discount_rate(&self, risk_score: u8, method: ScoringMethod, confidence: f64) -> Decimal {
        let tier = match risk_score {
            0..=20 => dec!(0.15),
            21..=30 => dec!(0.10),
            31..=40 => dec!(0.05),
            _ => Decimal::ZERO,
        };

        if method == ScoringMethod::MlEnhanced && confidence > ML_BONUS_CONFIDENCE {
            tier + dec!(0.02)
        } else {
            tier
        }
    }

    /// Mileage band and night driving surcharge; absent inputs are neutral
    pub fn usage_multiplier(&self, usage: &UsageProfile) -> Decimal {
        let mut multiplier = Decimal::ONE;

        if let Some(mileage) = usage.annual_mileage {
            if mileage < 5_000.0 {
                multiplier *= dec!(0.90);
            } else if mileage > 15_000.0 {
                multiplier *= dec!(1.15);
            }
        }

        if let Some(night_pct) = usage.night_driving_pct.filter(|pct| *pct > 30.0) {
            let night_pct = Decimal::from_f64(night_pct).unwrap_or(Decimal::ZERO);
            multiplier *= Decimal::ONE + night_pct / dec!(200);
        }

        multiplier
    }

    pub fn demographic_multiplier(
        &self,
        profile: Option<&DemographicProfile>,
        as_of: NaiveDate,
    ) -> Decimal {
        demographics::demographic_multiplier(profile, as_of, self.config.default_license_years)
    }

    /// Price one quote
    pub fn quote(&self, input: &QuoteInput) -> PricingQuote {
        let base_premium = self.base_premium(input.coverage_type);
        let risk_multiplier = self.risk_multiplier(input.risk_score);
        let usage_multiplier = self.usage_multiplier(&input.usage);
        let discount_rate =
            self.discount_rate(input.risk_score, input.scoring_method, input.confidence);

        let after_risk_adjustment = base_premium * risk_multiplier;
        let after_demographics = after_risk_adjustment * input.demographic_multiplier;
        let after_usage = after_demographics * usage_multiplier;
        let after_discounts = after_usage * (Decimal::ONE - discount_rate);

        let final_premium = round_cents(after_discounts);
        let potential_savings = round_cents((base_premium - after_discounts).max(Decimal::ZERO));

        debug!(
            coverage = %input.coverage_type,
            risk_score = input.risk_score,
            %final_premium,
            "Premium calculated"
        );

        PricingQuote {
            quote_id: Uuid::now_v7(),
            coverage_type: input.coverage_type,
            base_premium,
            final_premium,
            potential_savings,
            risk_score: input.risk_score,
            risk_multiplier,
            demographic_multiplier: input.demographic_multiplier,
            usage_multiplier,
            discount_rate,
            scoring_method: input.scoring_method,
            confidence: input.confidence,
            breakdown: PremiumBreakdown {
                base_premium,
                after_risk_adjustment,
                after_demographics,
                after_usage,
                after_discounts,
            },
            calculated_at: Utc::now(),
        }
    }
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
