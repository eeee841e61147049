//! Pricing service
//!
//! Resolves the subject's risk score and demographics, then prices one or
//! more coverage tiers. A score failure is propagated; a demographic failure
//! is logged and priced at the neutral multiplier so a quote is always
//! produced for a scorable subject.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use telematics_common::{
    CoverageType, DemographicProvider, FactorKind, PricingQuote, Result, RiskFactors,
    ScoreProvider, ScoreQuery, ScoreResult, UsageProfile,
};
use tracing::{debug, info, instrument, warn};

use crate::calculator::{PricingCalculator, QuoteInput};
use crate::comparison::{recommend, CoverageRecommendation, PremiumComparison};

/// Single-tier quote request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub subject_id: String,
    pub window_days: i64,
    /// Tier name; full coverage when absent
    #[serde(default)]
    pub coverage_type: Option<String>,
    /// Explicit usage inputs; derived from the score when absent
    #[serde(default)]
    pub usage: Option<UsageProfile>,
}

impl QuoteRequest {
    pub fn new(subject_id: impl Into<String>, window_days: i64) -> Self {
        Self {
            subject_id: subject_id.into(),
            window_days,
            coverage_type: None,
            usage: None,
        }
    }

    pub fn with_coverage(mut self, coverage_type: impl Into<String>) -> Self {
        self.coverage_type = Some(coverage_type.into());
        self
    }

    pub fn with_usage(mut self, usage: UsageProfile) -> Self {
        self.usage = Some(usage);
        self
    }

    fn score_query(&self) -> ScoreQuery {
        ScoreQuery::new(self.subject_id.clone(), self.window_days)
    }
}

/// Multi-tier comparison request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub subject_id: String,
    pub window_days: i64,
    /// Tier names; all tiers when empty
    #[serde(default)]
    pub coverage_types: Vec<String>,
    #[serde(default)]
    pub usage: Option<UsageProfile>,
}

impl CompareRequest {
    pub fn new(subject_id: impl Into<String>, window_days: i64) -> Self {
        Self {
            subject_id: subject_id.into(),
            window_days,
            coverage_types: Vec::new(),
            usage: None,
        }
    }

    pub fn with_coverage_types<I, S>(mut self, coverage_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.coverage_types = coverage_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_usage(mut self, usage: UsageProfile) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Parsed, de-duplicated tiers in ascending order
    pub fn tiers(&self) -> std::result::Result<Vec<CoverageType>, telematics_common::RequestError> {
        if self.coverage_types.is_empty() {
            return Ok(CoverageType::ALL.to_vec());
        }
        let tiers = self
            .coverage_types
            .iter()
            .map(|name| CoverageType::parse(name))
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        Ok(tiers.into_iter().collect())
    }
}

/// Usage inputs implied by a score's factors.
///
/// Annual mileage is daily mileage × 365 and the night share is the time of
/// day rate in percent. Factors from the neutral prior carry neither.
pub fn derive_usage(factors: &RiskFactors) -> UsageProfile {
    let annual_mileage = factors
        .get(FactorKind::Mileage)
        .and_then(|f| f.stat("dailyMileage"))
        .map(|daily| daily * 365.0);
    let night_driving_pct = factors
        .get(FactorKind::TimeOfDay)
        .map(|f| (f.rate * 100.0).clamp(0.0, 100.0));

    UsageProfile::new(annual_mileage, night_driving_pct)
}

/// Premium pricing service
pub struct PricingService {
    calculator: PricingCalculator,
    scores: Arc<dyn ScoreProvider>,
    demographics: Arc<dyn DemographicProvider>,
    reference_date: Option<NaiveDate>,
}

impl PricingService {
    pub fn new(
        calculator: PricingCalculator,
        scores: Arc<dyn ScoreProvider>,
        demographics: Arc<dyn DemographicProvider>,
    ) -> Self {
        Self {
            calculator,
            scores,
            demographics,
            reference_date: None,
        }
    }

    /// Fix the date ages and licence experience are measured at
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn calculator(&self) -> &PricingCalculator {
        &self.calculator
    }

    /// Quote a single coverage tier
    #[instrument(skip(self), fields(subject_id = %request.subject_id))]
    pub async fn quote(&self, request: &QuoteRequest) -> Result<PricingQuote> {
        let query = request.score_query();
        query.validate()?;
        let coverage_type = match &request.coverage_type {
            Some(name) => CoverageType::parse(name)?,
            None => CoverageType::default(),
        };
        if let Some(usage) = &request.usage {
            usage.validate()?;
        }

        let score = self.scores.risk_score(&query).await?;
        let demographic_multiplier = self.demographic_multiplier(&request.subject_id).await;
        let input = self.quote_input(coverage_type, &score, demographic_multiplier, request.usage);

        let quote = self.calculator.quote(&input);
        info!(
            coverage = %quote.coverage_type,
            risk_score = quote.risk_score,
            final_premium = %quote.final_premium,
            "Quote calculated"
        );
        Ok(quote)
    }

    /// Quote several tiers against one score and recommend between them
    #[instrument(skip(self), fields(subject_id = %request.subject_id))]
    pub async fn compare(&self, request: &CompareRequest) -> Result<PremiumComparison> {
        let query = ScoreQuery::new(request.subject_id.clone(), request.window_days);
        query.validate()?;
        let tiers = request.tiers()?;
        if let Some(usage) = &request.usage {
            usage.validate()?;
        }

        let score = self.scores.risk_score(&query).await?;
        let demographic_multiplier = self.demographic_multiplier(&request.subject_id).await;

        let quotes: Vec<PricingQuote> = tiers
            .into_iter()
            .map(|tier| {
                let input = self.quote_input(tier, &score, demographic_multiplier, request.usage);
                self.calculator.quote(&input)
            })
            .collect();
        let recommendation = self.recommend(&quotes);

        debug!(
            tiers = quotes.len(),
            recommended = ?recommendation.as_ref().map(|r| r.recommended),
            "Comparison calculated"
        );

        Ok(PremiumComparison {
            quotes,
            recommendation,
        })
    }

    /// Recommendation for already computed quotes
    pub fn recommend(&self, quotes: &[PricingQuote]) -> Option<CoverageRecommendation> {
        recommend(quotes, self.calculator.config().comparison_threshold)
    }

    fn quote_input(
        &self,
        coverage_type: CoverageType,
        score: &ScoreResult,
        demographic_multiplier: Decimal,
        usage: Option<UsageProfile>,
    ) -> QuoteInput {
        let usage = usage.unwrap_or_else(|| derive_usage(&score.factors));
        QuoteInput::from_score(coverage_type, score)
            .with_demographic_multiplier(demographic_multiplier)
            .with_usage(usage)
    }

    async fn demographic_multiplier(&self, subject_id: &str) -> Decimal {
        let as_of = self
            .reference_date
            .unwrap_or_else(|| Utc::now().date_naive());

        match self.demographics.profile(subject_id).await {
            Ok(profile) => self.calculator.demographic_multiplier(Some(&profile), as_of),
            Err(e) => {
                warn!(subject_id, error = %e, "Demographic lookup failed, using neutral multiplier");
                Decimal::ONE
            }
        }
    }
}
