//! Driver recommendations derived from factor rates

use serde::{Deserialize, Serialize};
use telematics_common::{FactorKind, RiskFactors};

/// Recommendation urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// One actionable recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: String,
    pub priority: Priority,
    pub message: String,
    /// Estimated yearly saving in dollars
    pub potential_savings: u32,
}

struct Rule {
    factor: FactorKind,
    threshold: f64,
    category: &'static str,
    priority: Priority,
    message: &'static str,
    savings: u32,
}

const RULES: [Rule; 4] = [
    Rule {
        factor: FactorKind::SpeedViolations,
        threshold: 0.1,
        category: "Speed Management",
        priority: Priority::High,
        message: "Reduce speeding to lower your premium",
        savings: 200,
    },
    Rule {
        factor: FactorKind::HarshEvents,
        threshold: 0.05,
        category: "Smooth Driving",
        priority: Priority::Medium,
        message: "Brake and accelerate more gradually",
        savings: 150,
    },
    Rule {
        factor: FactorKind::PhoneUsage,
        threshold: 0.02,
        category: "Distracted Driving",
        priority: Priority::High,
        message: "Avoid using your phone while driving",
        savings: 300,
    },
    Rule {
        factor: FactorKind::TimeOfDay,
        threshold: 0.3,
        category: "Drive Time",
        priority: Priority::Low,
        message: "Shift trips away from late night hours where possible",
        savings: 75,
    },
];

/// Recommendations for every factor whose rate exceeds its threshold
pub fn recommendations(factors: &RiskFactors) -> Vec<Recommendation> {
    RULES
        .iter()
        .filter(|rule| {
            factors
                .get(rule.factor)
                .is_some_and(|factor| factor.rate > rule.threshold)
        })
        .map(|rule| Recommendation {
            category: rule.category.to_string(),
            priority: rule.priority,
            message: rule.message.to_string(),
            potential_savings: rule.savings,
        })
        .collect()
}
