//! Log-odds blending of a market probability with a historical prior.
//!
//! Both inputs are clamped to `[PROBABILITY_EPSILON, 1 - PROBABILITY_EPSILON]`
//! before the logit transform so extreme prices stay finite.

use std::collections::BTreeMap;

use leader_ev_core::{BacktestConfig, DEFAULT_ACCURACY_PRIOR};
use serde::{Deserialize, Serialize};

/// Clamp margin applied before taking log-odds.
pub const PROBABILITY_EPSILON: f64 = 1e-6;

/// Default weight of the prior.
pub const DEFAULT_BLEND_WEIGHT: f64 = 0.5;

/// Clamps a probability into the open interval used for log-odds.
#[must_use]
pub fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
}

/// `ln(x / (1 - x))`.
#[must_use]
pub fn logit(x: f64) -> f64 {
    (x / (1.0 - x)).ln()
}

/// `1 / (1 + e^-x)`.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Weighted average of `q` and `prior` in log-odds space.
///
/// `lam = 0` returns (clamped) `q`, `lam = 1` returns (clamped) `prior`.
#[must_use]
pub fn blend_log_odds(q: f64, prior: f64, lam: f64) -> f64 {
    let q = clamp_probability(q);
    let prior = clamp_probability(prior);
    sigmoid((1.0 - lam) * logit(q) + lam * logit(prior))
}

/// Blends market probabilities with per-horizon accuracy priors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityBlender {
    priors: BTreeMap<String, f64>,
    default_prior: f64,
    weight: f64,
}

impl Default for ProbabilityBlender {
    fn default() -> Self {
        Self::new(BTreeMap::new(), DEFAULT_ACCURACY_PRIOR, DEFAULT_BLEND_WEIGHT)
    }
}

impl ProbabilityBlender {
    #[must_use]
    pub fn new(priors: BTreeMap<String, f64>, default_prior: f64, weight: f64) -> Self {
        Self {
            priors,
            default_prior,
            weight,
        }
    }

    /// Builds a blender from the accuracy table and weight of a run config.
    #[must_use]
    pub fn from_config(config: &BacktestConfig) -> Self {
        Self::new(
            config.historical_accuracy.clone(),
            config.default_accuracy,
            config.blend_weight,
        )
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Prior for `label`, falling back to the default prior.
    #[must_use]
    pub fn prior_for(&self, label: &str) -> f64 {
        self.priors
            .get(label)
            .copied()
            .unwrap_or(self.default_prior)
    }

    /// Blends `q_market` with the prior registered for `label`.
    #[must_use]
    pub fn blend(&self, q_market: f64, label: &str) -> f64 {
        blend_log_odds(q_market, self.prior_for(label), self.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn blender(weight: f64) -> ProbabilityBlender {
        let mut priors = BTreeMap::new();
        priors.insert("10d".to_string(), 0.91);
        priors.insert("5d".to_string(), 0.95);
        ProbabilityBlender::new(priors, DEFAULT_ACCURACY_PRIOR, weight)
    }

    #[test]
    fn logit_and_sigmoid_are_inverse() {
        for p in [0.01, 0.2, 0.5, 0.73, 0.999] {
            assert!((sigmoid(logit(p)) - p).abs() < TOL);
        }
        assert!((logit(0.5)).abs() < TOL);
        assert!((sigmoid(0.0) - 0.5).abs() < TOL);
    }

    #[test]
    fn zero_weight_returns_market_probability() {
        let b = blender(0.0);
        for q in [0.1, 0.5, 0.8, 0.99] {
            assert!((b.blend(q, "10d") - q).abs() < TOL);
            assert!((b.blend(q, "unknown") - q).abs() < TOL);
        }
    }

    #[test]
    fn zero_weight_clamps_extremes() {
        let b = blender(0.0);
        assert!((b.blend(0.0, "10d") - PROBABILITY_EPSILON).abs() < TOL);
        assert!((b.blend(1.0, "10d") - (1.0 - PROBABILITY_EPSILON)).abs() < TOL);
    }

    #[test]
    fn full_weight_returns_prior() {
        let b = blender(1.0);
        for q in [0.0, 0.3, 0.6, 1.0] {
            assert!((b.blend(q, "10d") - 0.91).abs() < TOL);
            assert!((b.blend(q, "5d") - 0.95).abs() < TOL);
        }
    }

    #[test]
    fn unknown_label_uses_default_prior() {
        let b = blender(1.0);
        assert!((b.prior_for("3d") - DEFAULT_ACCURACY_PRIOR).abs() < TOL);
        assert!((b.blend(0.4, "3d") - DEFAULT_ACCURACY_PRIOR).abs() < TOL);
    }

    #[test]
    fn blend_is_monotonic_in_market_probability() {
        let b = blender(0.5);
        let mut last = 0.0;
        for i in 1..100 {
            let q = f64::from(i) / 100.0;
            let p = b.blend(q, "10d");
            assert!(p > last, "blend not increasing at q = {q}");
            last = p;
        }
    }

    #[test]
    fn half_weight_is_midpoint_in_log_odds() {
        let b = blender(0.5);
        let expected = sigmoid(0.5 * logit(0.6) + 0.5 * logit(0.91));
        assert!((b.blend(0.6, "10d") - expected).abs() < TOL);
    }

    #[test]
    fn from_config_uses_table_and_weight() {
        let config = BacktestConfig::default()
            .with_blend_weight(0.25)
            .with_accuracy("1d", 0.97);
        let b = ProbabilityBlender::from_config(&config);
        assert!((b.weight() - 0.25).abs() < TOL);
        assert!((b.prior_for("1d") - 0.97).abs() < TOL);
        assert!((b.prior_for("5d") - 0.95).abs() < TOL);
    }
}
