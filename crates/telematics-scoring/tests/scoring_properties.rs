use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use telematics_common::{DrivingEvents, FactorKind, RoadType, TelemetryRecord};
use telematics_scoring::{
    BlendState, HybridBlender, MlPrediction, Prediction, TraditionalScore, TraditionalScorer,
};

fn arb_record() -> impl Strategy<Value = TelemetryRecord> {
    (
        0i64..(60 * 24 * 30),
        0.0f64..140.0,
        any::<[bool; 4]>(),
        0usize..5,
        0u8..4,
    )
        .prop_map(|(minute, speed, flags, trip, road)| {
            let start = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
            let road_type = match road {
                0 => RoadType::City,
                1 => RoadType::Highway,
                2 => RoadType::Rural,
                _ => RoadType::Unknown,
            };
            TelemetryRecord::new(start + Duration::minutes(minute), speed, format!("trip-{}", trip))
                .with_road_type(road_type)
                .with_events(DrivingEvents {
                    harsh_braking: flags[0],
                    harsh_acceleration: flags[1],
                    harsh_turning: flags[2],
                    phone_usage: flags[3],
                })
        })
}

proptest! {
    #[test]
    fn traditional_score_in_range(records in prop::collection::vec(arb_record(), 0..200)) {
        let score = TraditionalScorer::default().score(&records);
        prop_assert!(score.risk_score <= 100);
        prop_assert_eq!(score.factors.is_empty(), records.is_empty());
    }

    #[test]
    fn analysis_is_deterministic(records in prop::collection::vec(arb_record(), 1..100)) {
        let scorer = TraditionalScorer::default();
        prop_assert_eq!(scorer.score(&records), scorer.score(&records));
    }

    #[test]
    fn factor_rates_are_bounded(records in prop::collection::vec(arb_record(), 1..100)) {
        let factors = TraditionalScorer::default().analyzer().analyze(&records).unwrap();
        for (kind, factor) in factors.iter() {
            // Harsh rate counts up to three flags per record
            let max = if *kind == FactorKind::HarshEvents { 3.0 } else { 1.0 };
            prop_assert!(
                (0.0..=max).contains(&factor.rate),
                "{} rate {} out of range", kind, factor.rate
            );
            prop_assert!(factor.score >= 0.0);
        }
    }

    #[test]
    fn blend_stays_between_inputs(
        traditional in 0u8..=100,
        ml_score in 0.0f64..=100.0,
        confidence in 0.0f64..=1.0,
        data_points in 0usize..500,
    ) {
        let blender = HybridBlender::default();
        let prediction = Prediction::Available(MlPrediction {
            risk_score: ml_score,
            confidence,
            risk_level: None,
        });
        let base = TraditionalScore { risk_score: traditional, ..TraditionalScore::neutral() };
        let outcome = blender.blend(data_points, &base, Some(&prediction));

        prop_assert!(outcome.risk_score <= 100);
        prop_assert!(outcome.ml_weight <= 0.8);
        match outcome.state {
            BlendState::InsufficientData => {
                prop_assert!(data_points < 50);
                prop_assert_eq!(outcome.risk_score, 50);
            }
            BlendState::MlEnhanced => {
                prop_assert!(confidence >= 0.7);
                let low = ml_score.min(f64::from(traditional)).floor();
                let high = ml_score.max(f64::from(traditional)).ceil();
                let score = f64::from(outcome.risk_score);
                prop_assert!(low <= score && score <= high);
            }
            BlendState::TraditionalFallback => {
                prop_assert!(confidence < 0.7);
                prop_assert_eq!(outcome.risk_score, traditional);
            }
        }
    }
}
