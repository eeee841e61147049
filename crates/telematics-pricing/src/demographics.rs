//! Demographic multiplier
//!
//! Average of an age bracket and a licence-experience bracket. Ages are whole
//! calendar years; licence experience is fractional years of 365.25 days.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use dashmap::DashMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use telematics_common::{DemographicError, DemographicProfile, DemographicProvider};

/// Whole years between birth and `as_of`
pub fn age_on(date_of_birth: NaiveDate, as_of: NaiveDate) -> i32 {
    let mut age = as_of.year() - date_of_birth.year();
    if (as_of.month(), as_of.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Fractional years since licence issue
pub fn license_years(issue_date: NaiveDate, as_of: NaiveDate) -> f64 {
    (as_of - issue_date).num_days() as f64 / 365.25
}

/// <25: 1.4, 25-34: 1.1, 35-54: 0.9, 55+: 1.0
pub fn age_multiplier(age: i32) -> Decimal {
    match age {
        a if a < 25 => dec!(1.4),
        a if a < 35 => dec!(1.1),
        a if a < 55 => dec!(0.9),
        _ => dec!(1.0),
    }
}

/// <2y: 1.3, 2-4y: 1.1, 5-9y: 0.95, 10y+: 0.85
pub fn experience_multiplier(years: f64) -> Decimal {
    if years < 2.0 {
        dec!(1.3)
    } else if years < 5.0 {
        dec!(1.1)
    } else if years < 10.0 {
        dec!(0.95)
    } else {
        dec!(0.85)
    }
}

/// Demographic multiplier for a profile, 1.0 without one
pub fn demographic_multiplier(
    profile: Option<&DemographicProfile>,
    as_of: NaiveDate,
    default_license_years: f64,
) -> Decimal {
    let Some(profile) = profile else {
        return Decimal::ONE;
    };

    let age = age_on(profile.date_of_birth, as_of);
    let experience = profile
        .license_issue_date
        .map(|issued| license_years(issued, as_of))
        .unwrap_or(default_license_years);

    (age_multiplier(age) + experience_multiplier(experience)) / dec!(2)
}

/// Demographic profiles held in memory
#[derive(Default)]
pub struct InMemoryDemographics {
    profiles: DashMap<String, DemographicProfile>,
}

impl InMemoryDemographics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, subject_id: impl Into<String>, profile: DemographicProfile) {
        self.profiles.insert(subject_id.into(), profile);
    }
}

#[async_trait]
impl DemographicProvider for InMemoryDemographics {
    async fn profile(&self, subject_id: &str) -> Result<DemographicProfile, DemographicError> {
        self.profiles
            .get(subject_id)
            .map(|profile| profile.clone())
            .ok_or_else(|| DemographicError::NotFound(subject_id.to_string()))
    }
}
