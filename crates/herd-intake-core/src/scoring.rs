//! Pluggable scoring for risk rating, valuation, and confidence.
//!
//! There is no real credit model behind these numbers. [`RandomScorer`] is a
//! mock that draws from a seedable RNG; anything implementing [`Scorer`] can
//! replace it without touching ingestion or storage.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::form::{FormData, HERD_VALUE, LIVESTOCK_COUNT};
use crate::models::{InsightsSummary, RiskRating};

/// Unit value assumed per head when the form declares no herd value.
pub const DEFAULT_UNIT_VALUE: f64 = 1200.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub risk_rating: RiskRating,
    pub valuation: f64,
    pub confidence: f64,
}

pub trait Scorer: Send {
    fn assess(&mut self, form: &FormData, insights: &InsightsSummary) -> Assessment;
}

/// Buckets a uniform draw in `[0, 1)` into three equal tiers.
pub fn risk_from_draw(draw: f64) -> RiskRating {
    if draw < 1.0 / 3.0 {
        RiskRating::Low
    } else if draw < 2.0 / 3.0 {
        RiskRating::Medium
    } else {
        RiskRating::High
    }
}

/// Declared herd value, or head count times [`DEFAULT_UNIT_VALUE`].
pub fn base_value(form: &FormData) -> f64 {
    match form.number(HERD_VALUE) {
        Some(v) if v > 0.0 => v,
        _ => (form.number(LIVESTOCK_COUNT).unwrap_or(0.0).max(0.0) * DEFAULT_UNIT_VALUE)
            .min(f64::MAX),
    }
}

pub struct RandomScorer {
    rng: StdRng,
}

impl RandomScorer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Scorer for RandomScorer {
    fn assess(&mut self, form: &FormData, _insights: &InsightsSummary) -> Assessment {
        let risk_rating = risk_from_draw(self.rng.gen::<f64>());
        let factor: f64 = self.rng.gen_range(0.9..1.1);
        // Saturate instead of overflowing; JSON has no infinity.
        let valuation = (base_value(form) * factor).round().min(f64::MAX);
        let confidence = (self.rng.gen_range(0.75..=0.95_f64) * 100.0).round() / 100.0;

        Assessment {
            risk_rating,
            valuation,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draws_bucket_into_three_tiers() {
        assert_eq!(risk_from_draw(0.0), RiskRating::Low);
        assert_eq!(risk_from_draw(0.33), RiskRating::Low);
        assert_eq!(risk_from_draw(0.5), RiskRating::Medium);
        assert_eq!(risk_from_draw(0.67), RiskRating::High);
        assert_eq!(risk_from_draw(0.999), RiskRating::High);
    }

    #[test]
    fn seeded_scorers_agree() {
        let form: FormData = serde_json::from_value(json!({ "herdValue": 50000 })).unwrap();
        let insights = InsightsSummary::default();
        let a = RandomScorer::seeded(7).assess(&form, &insights);
        let b = RandomScorer::seeded(7).assess(&form, &insights);
        assert_eq!(a, b);
    }

    #[test]
    fn valuation_stays_within_ten_percent_of_base() {
        let form: FormData = serde_json::from_value(json!({ "livestockCount": "10" })).unwrap();
        let insights = InsightsSummary::default();
        let mut scorer = RandomScorer::seeded(1);
        for _ in 0..50 {
            let a = scorer.assess(&form, &insights);
            assert!((10_800.0..=13_200.0).contains(&a.valuation));
            assert!((0.75..=0.95).contains(&a.confidence));
        }
    }

    #[test]
    fn herd_value_takes_precedence_over_count() {
        let form: FormData =
            serde_json::from_value(json!({ "herdValue": "9000", "livestockCount": 100 })).unwrap();
        assert_eq!(base_value(&form), 9000.0);
        assert_eq!(base_value(&FormData::new()), 0.0);
    }

    #[test]
    fn huge_declared_values_give_finite_valuation() {
        let insights = InsightsSummary::default();
        for form in [
            json!({ "herdValue": 1.7e308 }),
            json!({ "livestockCount": "1e307" }),
        ] {
            let form: FormData = serde_json::from_value(form).unwrap();
            for seed in 0..20 {
                let assessment = RandomScorer::seeded(seed).assess(&form, &insights);
                assert!(assessment.valuation.is_finite());
                assert!(assessment.valuation > 0.0);
            }
        }
    }
}
