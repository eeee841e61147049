//! # Telematics Pricing
//!
//! Converts a risk score into a monthly premium quote:
//!
//! ```text
//! final = base × risk × demographic × usage × (1 − discount)
//! ```
//!
//! - [`PricingCalculator`]: pure premium arithmetic
//! - [`PricingService`]: resolves scores and demographics, then quotes
//! - [`recommend`]: full-vs-lower tier recommendation for comparisons
//!
//! Pricing reads scores only through [`telematics_common::ScoreProvider`].

pub mod calculator;
pub mod comparison;
pub mod demographics;
pub mod service;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use telematics_common::CoverageType;

pub use calculator::{PricingCalculator, QuoteInput};
pub use comparison::{recommend, CoverageRecommendation, PremiumComparison};
pub use demographics::{age_multiplier, experience_multiplier, InMemoryDemographics};
pub use service::{derive_usage, CompareRequest, PricingService, QuoteRequest};

/// Monthly base premium per coverage tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePremiums {
    pub basic: Decimal,
    pub standard: Decimal,
    pub full: Decimal,
    pub premium: Decimal,
}

impl Default for BasePremiums {
    fn default() -> Self {
        Self {
            basic: dec!(85),
            standard: dec!(125),
            full: dec!(175),
            premium: dec!(225),
        }
    }
}

impl BasePremiums {
    pub fn for_coverage(&self, coverage: CoverageType) -> Decimal {
        match coverage {
            CoverageType::Basic => self.basic,
            CoverageType::Standard => self.standard,
            CoverageType::Full => self.full,
            CoverageType::Premium => self.premium,
        }
    }
}

/// Pricing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub base_premiums: BasePremiums,
    /// Full coverage is recommended when it costs less than this much more
    pub comparison_threshold: Decimal,
    /// Licence experience assumed when the issue date is unknown
    pub default_license_years: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_premiums: BasePremiums::default(),
            comparison_threshold: dec!(100),
            default_license_years: 5.0,
        }
    }
}
