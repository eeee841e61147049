//! Pricing through the public service API with stub collaborators

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use telematics_common::{
    CoverageType, DataQuality, DemographicProfile, Result, RiskFactors, ScoreProvider, ScoreQuery,
    ScoreResult, ScoringMethod, TelematicsError, TelemetryRecord, UsageProfile,
};
use telematics_pricing::{
    derive_usage, CompareRequest, InMemoryDemographics, PricingCalculator, PricingService,
    QuoteRequest,
};
use telematics_scoring::{
    DisabledPredictor, InMemoryTelemetrySource, ResultCache, ScoringConfig, ScoringService,
};

struct FixedScores {
    scores: HashMap<String, ScoreResult>,
}

#[async_trait]
impl ScoreProvider for FixedScores {
    async fn risk_score(&self, query: &ScoreQuery) -> Result<ScoreResult> {
        self.scores
            .get(&query.subject_id)
            .cloned()
            .ok_or_else(|| TelematicsError::Telemetry(format!("no data for {}", query.subject_id)))
    }
}

fn score(risk_score: u8, method: ScoringMethod, confidence: f64) -> ScoreResult {
    ScoreResult {
        risk_score,
        method,
        confidence,
        traditional_score: Some(risk_score),
        ml_score: None,
        factors: RiskFactors::new(),
        data_quality: DataQuality {
            total_data_points: 400,
            time_span_days: 30,
            sufficient_data: true,
        },
        generated_at: Utc::now(),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// "u1" has a 40-year-old profile with 20 years of licence; "u2" has no profile
fn service() -> PricingService {
    let scores = FixedScores {
        scores: [
            ("u1".to_string(), score(15, ScoringMethod::Traditional, 0.9)),
            ("u2".to_string(), score(15, ScoringMethod::Traditional, 0.9)),
        ]
        .into_iter()
        .collect(),
    };
    let demographics = InMemoryDemographics::new();
    demographics.insert(
        "u1",
        DemographicProfile::new(date(1984, 6, 1), Some(date(2004, 6, 1))),
    );

    PricingService::new(
        PricingCalculator::default(),
        Arc::new(scores),
        Arc::new(demographics),
    )
    .with_reference_date(date(2025, 1, 1))
}

#[tokio::test]
async fn quote_applies_demographics() {
    let quote = service().quote(&QuoteRequest::new("u1", 30)).await.unwrap();

    // 175 × 0.75 × 0.875 × 0.85
    assert_eq!(quote.coverage_type, CoverageType::Full);
    assert_eq!(quote.demographic_multiplier, dec!(0.875));
    assert_eq!(quote.breakdown.after_discounts, dec!(97.6171875));
    assert_eq!(quote.final_premium, dec!(97.62));
    assert_eq!(quote.potential_savings, dec!(77.38));
}

#[tokio::test]
async fn missing_demographics_price_neutrally() {
    let quote = service().quote(&QuoteRequest::new("u2", 30)).await.unwrap();

    assert_eq!(quote.demographic_multiplier, Decimal::ONE);
    assert_eq!(quote.final_premium, dec!(111.56));
}

#[tokio::test]
async fn score_failure_propagates() {
    let err = service()
        .quote(&QuoteRequest::new("nobody", 30))
        .await
        .unwrap_err();

    assert!(matches!(err, TelematicsError::Telemetry(_)));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn request_shape_errors_are_client_errors() {
    let service = service();

    let bad_window = service.quote(&QuoteRequest::new("u1", 0)).await.unwrap_err();
    assert!(bad_window.is_client_error());

    let bad_coverage = service
        .quote(&QuoteRequest::new("u1", 30).with_coverage("full coverage!"))
        .await
        .unwrap_err();
    assert!(bad_coverage.is_client_error());

    let bad_usage = service
        .quote(&QuoteRequest::new("u1", 30).with_usage(UsageProfile::new(Some(-5.0), None)))
        .await
        .unwrap_err();
    assert!(bad_usage.is_client_error());
}

#[tokio::test]
async fn unknown_coverage_name_prices_full() {
    let quote = service()
        .quote(&QuoteRequest::new("u2", 30).with_coverage("collision"))
        .await
        .unwrap();

    assert_eq!(quote.coverage_type, CoverageType::Full);
    assert_eq!(quote.base_premium, dec!(175));
}

#[tokio::test]
async fn explicit_usage_overrides_derived() {
    let quote = service()
        .quote(
            &QuoteRequest::new("u2", 30)
                .with_coverage("basic")
                .with_usage(UsageProfile::new(Some(20_000.0), None)),
        )
        .await
        .unwrap();

    assert_eq!(quote.usage_multiplier, dec!(1.15));
    // 85 × 0.75 × 1.15 × 0.85 = 62.315625
    assert_eq!(quote.final_premium, dec!(62.32));
}

#[tokio::test]
async fn compare_all_tiers_recommends_full() {
    let comparison = service()
        .compare(&CompareRequest::new("u1", 30))
        .await
        .unwrap();

    let tiers: Vec<CoverageType> = comparison.quotes.iter().map(|q| q.coverage_type).collect();
    assert_eq!(tiers, CoverageType::ALL.to_vec());

    let rec = comparison.recommendation.unwrap();
    assert_eq!(rec.recommended, CoverageType::Full);
    assert_eq!(rec.compared_with, CoverageType::Standard);
    // 97.62 − 69.73
    assert_eq!(rec.premium_difference, dec!(27.89));
}

#[tokio::test]
async fn compare_without_full_has_no_recommendation() {
    let comparison = service()
        .compare(&CompareRequest::new("u1", 30).with_coverage_types(["basic", "premium", "basic"]))
        .await
        .unwrap();

    assert_eq!(comparison.quotes.len(), 2);
    assert!(comparison.recommendation.is_none());
}

#[tokio::test]
async fn quote_serializes_camel_case() {
    let quote = service().quote(&QuoteRequest::new("u1", 30)).await.unwrap();
    let json = serde_json::to_value(&quote).unwrap();

    assert_eq!(json["coverageType"], "full");
    assert_eq!(json["scoringMethod"], "traditional");
    assert_eq!(json["finalPremium"], "97.62");
    assert!(json["breakdown"]["afterRiskAdjustment"].is_string());

    let request: QuoteRequest =
        serde_json::from_str(r#"{"subjectId":"u1","windowDays":30,"coverageType":"basic"}"#)
            .unwrap();
    assert_eq!(request.coverage_type.as_deref(), Some("basic"));
    assert!(request.usage.is_none());
}

#[tokio::test]
async fn prices_scores_from_scoring_service() {
    let reference = Utc.with_ymd_and_hms(2024, 9, 2, 18, 0, 0).unwrap();
    let records: Vec<TelemetryRecord> = (0..5)
        .flat_map(|day| {
            let start = reference - Duration::days(day + 1);
            (0..30).map(move |i| {
                TelemetryRecord::new(start + Duration::seconds(i * 30), 45.0, format!("trip-{}", day))
            })
        })
        .collect();

    let telemetry = InMemoryTelemetrySource::new().with_reference_time(reference);
    telemetry.insert("driver", records);
    let scoring = Arc::new(ScoringService::new(
        ScoringConfig::default(),
        Arc::new(telemetry),
        Arc::new(DisabledPredictor),
        Arc::new(ResultCache::new()),
    ));

    let pricing = PricingService::new(
        PricingCalculator::default(),
        scoring.clone(),
        Arc::new(InMemoryDemographics::new()),
    );

    let query = ScoreQuery::new("driver", 30);
    let score = scoring.risk_score(&query).await.unwrap();
    let quote = pricing.quote(&QuoteRequest::new("driver", 30)).await.unwrap();

    assert_eq!(quote.risk_score, score.risk_score);
    assert_eq!(quote.scoring_method, ScoringMethod::TraditionalFallback);
    assert_eq!(
        quote.usage_multiplier,
        pricing.calculator().usage_multiplier(&derive_usage(&score.factors))
    );

    // Unknown subject scores at the neutral prior with no usage adjustment
    let neutral = pricing.quote(&QuoteRequest::new("stranger", 30)).await.unwrap();
    assert_eq!(neutral.risk_score, 50);
    assert_eq!(neutral.scoring_method, ScoringMethod::InsufficientData);
    assert_eq!(neutral.usage_multiplier, Decimal::ONE);
    assert_eq!(neutral.final_premium, dec!(175.00));
}
