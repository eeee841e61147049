//! Quote types - coverage tiers, pricing inputs and premium quotes
//!
//! ```text
//! final = base × risk × demographic × usage × (1 − discount)
//! ```
//!
//! Multipliers and breakdown steps are kept at full precision; only the final
//! premium and the savings figure are rounded (2 dp, half away from zero).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RequestError;
use crate::types::risk::ScoringMethod;

/// Insurance product tier, ordered from cheapest to most comprehensive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageType {
    Basic,
    Standard,
    Full,
    Premium,
}

impl CoverageType {
    pub const ALL: [CoverageType; 4] = [
        CoverageType::Basic,
        CoverageType::Standard,
        CoverageType::Full,
        CoverageType::Premium,
    ];

    /// Parse a caller-supplied tier name.
    ///
    /// Unknown but well-formed names fall back to [`CoverageType::Full`];
    /// empty or malformed names are rejected.
    pub fn parse(value: &str) -> Result<Self, RequestError> {
        let trimmed = value.trim();
        let well_formed = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !well_formed {
            return Err(RequestError::MalformedCoverageType(value.to_string()));
        }

        Ok(match trimmed.to_ascii_lowercase().as_str() {
            "basic" => CoverageType::Basic,
            "standard" => CoverageType::Standard,
            "full" => CoverageType::Full,
            "premium" => CoverageType::Premium,
            _ => CoverageType::Full,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageType::Basic => "basic",
            CoverageType::Standard => "standard",
            CoverageType::Full => "full",
            CoverageType::Premium => "premium",
        }
    }
}

impl Default for CoverageType {
    fn default() -> Self {
        CoverageType::Full
    }
}

impl FromStr for CoverageType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CoverageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policyholder demographics used for the demographic multiplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicProfile {
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub license_issue_date: Option<NaiveDate>,
}

impl DemographicProfile {
    pub fn new(date_of_birth: NaiveDate, license_issue_date: Option<NaiveDate>) -> Self {
        Self {
            date_of_birth,
            license_issue_date,
        }
    }
}

/// Optional usage inputs for the usage multiplier
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageProfile {
    /// Miles per year
    #[serde(default)]
    pub annual_mileage: Option<f64>,
    /// Night driving share in percent (0-100)
    #[serde(default)]
    pub night_driving_pct: Option<f64>,
}

impl UsageProfile {
    pub fn new(annual_mileage: Option<f64>, night_driving_pct: Option<f64>) -> Self {
        Self {
            annual_mileage,
            night_driving_pct,
        }
    }

    /// Reject negative or non-finite inputs
    pub fn validate(&self) -> Result<(), RequestError> {
        let bad = |v: Option<f64>| v.is_some_and(|x| !x.is_finite() || x < 0.0);
        if bad(self.annual_mileage) {
            return Err(RequestError::InvalidUsage(format!(
                "annual mileage {:?}",
                self.annual_mileage
            )));
        }
        if bad(self.night_driving_pct) || self.night_driving_pct.is_some_and(|x| x > 100.0) {
            return Err(RequestError::InvalidUsage(format!(
                "night driving percentage {:?}",
                self.night_driving_pct
            )));
        }
        Ok(())
    }
}

/// Intermediate premium after each multiplication step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumBreakdown {
    pub base_premium: Decimal,
    pub after_risk_adjustment: Decimal,
    pub after_demographics: Decimal,
    pub after_usage: Decimal,
    pub after_discounts: Decimal,
}

impl PremiumBreakdown {
    /// Steps in application order
    pub fn steps(&self) -> [Decimal; 5] {
        [
            self.base_premium,
            self.after_risk_adjustment,
            self.after_demographics,
            self.after_usage,
            self.after_discounts,
        ]
    }
}

/// Monthly premium quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingQuote {
    pub quote_id: Uuid,
    pub coverage_type: CoverageType,
    pub base_premium: Decimal,
    /// Rounded to 2 dp
    pub final_premium: Decimal,
    /// max(0, base − final), rounded to 2 dp
    pub potential_savings: Decimal,
    pub risk_score: u8,
    pub risk_multiplier: Decimal,
    pub demographic_multiplier: Decimal,
    pub usage_multiplier: Decimal,
    /// Discount rate in [0, 1)
    pub discount_rate: Decimal,
    pub scoring_method: ScoringMethod,
    pub confidence: f64,
    pub breakdown: PremiumBreakdown,
    pub calculated_at: DateTime<Utc>,
}

impl PricingQuote {
    /// Whether an ML prediction contributed to the underlying score
    pub fn ml_enhanced(&self) -> bool {
        self.scoring_method == ScoringMethod::MlEnhanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_coverage_types() {
        assert_eq!(CoverageType::parse("basic"), Ok(CoverageType::Basic));
        assert_eq!(CoverageType::parse("Standard"), Ok(CoverageType::Standard));
        assert_eq!(CoverageType::parse(" PREMIUM "), Ok(CoverageType::Premium));
    }

    #[test]
    fn test_unknown_coverage_falls_back_to_full() {
        assert_eq!(CoverageType::parse("collision"), Ok(CoverageType::Full));
        assert_eq!(CoverageType::parse("liability"), Ok(CoverageType::Full));
    }

    #[test]
    fn test_malformed_coverage_rejected() {
        assert!(CoverageType::parse("").is_err());
        assert!(CoverageType::parse("full; drop").is_err());
        assert!("   ".parse::<CoverageType>().is_err());
    }

    #[test]
    fn test_coverage_ordering() {
        assert!(CoverageType::Basic < CoverageType::Standard);
        assert!(CoverageType::Standard < CoverageType::Full);
        assert!(CoverageType::Full < CoverageType::Premium);
    }

    #[test]
    fn test_usage_validation() {
        assert!(UsageProfile::new(Some(12_000.0), Some(20.0)).validate().is_ok());
        assert!(UsageProfile::default().validate().is_ok());
        assert!(UsageProfile::new(Some(-1.0), None).validate().is_err());
        assert!(UsageProfile::new(None, Some(140.0)).validate().is_err());
        assert!(UsageProfile::new(Some(f64::NAN), None).validate().is_err());
    }
}
