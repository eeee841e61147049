//! Premium comparison across coverage tiers
//!
//! Full coverage is weighed against the highest requested tier below it.
//! When the extra monthly cost stays under the configured threshold, full
//! coverage is recommended; otherwise the cheaper tier is.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use telematics_common::{CoverageType, PricingQuote};

/// Quotes for several tiers plus an optional recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumComparison {
    /// One quote per requested tier, cheapest tier first
    pub quotes: Vec<PricingQuote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<CoverageRecommendation>,
}

impl PremiumComparison {
    pub fn quote_for(&self, coverage_type: CoverageType) -> Option<&PricingQuote> {
        self.quotes.iter().find(|q| q.coverage_type == coverage_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRecommendation {
    pub recommended: CoverageType,
    pub compared_with: CoverageType,
    /// Full premium minus the lower tier premium
    pub premium_difference: Decimal,
    pub reason: String,
}

/// Recommend between full coverage and the next requested tier down.
///
/// Returns `None` when full coverage or any lower tier is missing.
pub fn recommend(quotes: &[PricingQuote], threshold: Decimal) -> Option<CoverageRecommendation> {
    let full = quotes
        .iter()
        .find(|q| q.coverage_type == CoverageType::Full)?;
    let lower = quotes
        .iter()
        .filter(|q| q.coverage_type < CoverageType::Full)
        .max_by_key(|q| q.coverage_type)?;

    let difference = full.final_premium - lower.final_premium;

    let recommendation = if difference < threshold {
        CoverageRecommendation {
            recommended: CoverageType::Full,
            compared_with: lower.coverage_type,
            premium_difference: difference,
            reason: "Full coverage offers great value for minimal additional cost".to_string(),
        }
    } else {
        CoverageRecommendation {
            recommended: lower.coverage_type,
            compared_with: CoverageType::Full,
            premium_difference: difference,
            reason: format!(
                "{} coverage saves {} per month over full coverage",
                capitalize(lower.coverage_type.as_str()),
                difference
            ),
        }
    };

    Some(recommendation)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PricingCalculator, QuoteInput};
    use rust_decimal_macros::dec;
    use telematics_common::ScoringMethod;

    fn quotes(risk_score: u8, tiers: &[CoverageType]) -> Vec<PricingQuote> {
        let calc = PricingCalculator::default();
        tiers
            .iter()
            .map(|&tier| {
                calc.quote(&QuoteInput::new(
                    tier,
                    risk_score,
                    ScoringMethod::Traditional,
                    0.9,
                ))
            })
            .collect()
    }

    #[test]
    fn test_full_recommended_when_cheap() {
        // 175 vs 125 at the neutral multiplier: difference 50
        let quotes = quotes(50, &CoverageType::ALL);
        let rec = recommend(&quotes, dec!(100)).unwrap();

        assert_eq!(rec.recommended, CoverageType::Full);
        assert_eq!(rec.compared_with, CoverageType::Standard);
        assert_eq!(rec.premium_difference, dec!(50));
    }

    #[test]
    fn test_lower_tier_recommended_over_threshold() {
        // 175 vs 85 at multiplier 1.5: difference 135
        let quotes = quotes(95, &[CoverageType::Basic, CoverageType::Full]);
        let rec = recommend(&quotes, dec!(100)).unwrap();

        assert_eq!(rec.recommended, CoverageType::Basic);
        assert_eq!(rec.compared_with, CoverageType::Full);
        assert_eq!(rec.premium_difference, dec!(135));
        assert!(rec.reason.starts_with("Basic coverage saves"));
    }

    #[test]
    fn test_missing_side_yields_none() {
        assert!(recommend(&quotes(50, &[CoverageType::Full]), dec!(100)).is_none());
        assert!(recommend(
            &quotes(50, &[CoverageType::Basic, CoverageType::Premium]),
            dec!(100)
        )
        .is_none());
        assert!(recommend(&[], dec!(100)).is_none());
    }

    #[test]
    fn test_quote_lookup() {
        let comparison = PremiumComparison {
            quotes: quotes(30, &[CoverageType::Standard, CoverageType::Full]),
            recommendation: None,
        };
        assert!(comparison.quote_for(CoverageType::Full).is_some());
        assert!(comparison.quote_for(CoverageType::Premium).is_none());
    }
}
