//! Per-horizon aggregation of evaluated records.
//!
//! Summaries are derived purely from the record collection. Groups follow the
//! configured horizon order; labels that produced no record are omitted, and
//! any label not in the configured order is appended in first-seen order.

use serde::{Deserialize, Serialize};

use super::outcome::{AccuracyRecord, EvRecord};

/// EV statistics for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonSummary {
    pub horizon: String,
    pub trades: usize,
    pub avg_ev: f64,
    pub med_ev: f64,
}

/// Leader hit-rate for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    pub horizon: String,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

/// Descriptive statistics of `best_ev` across all records.
///
/// Quantiles use linear interpolation between closest ranks. `std` is the
/// sample standard deviation and is absent for a single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvDistribution {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl EvDistribution {
    /// Describes `values`, or `None` when empty.
    #[must_use]
    pub fn describe(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = mean(&sorted);
        let std = (count > 1).then(|| {
            let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        });

        Some(Self {
            count,
            mean,
            std,
            min: sorted[0],
            p25: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            p75: quantile_sorted(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Median of `values` (mean of the two middle values for even counts).
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, 0.5))
}

/// Groups items by label, ordered by `order` first, then by first appearance.
fn group_by_label<'a, T>(
    items: &'a [T],
    label: impl Fn(&T) -> &str,
    order: &[String],
) -> Vec<(String, Vec<&'a T>)> {
    let mut groups: Vec<(String, Vec<&T>)> = order.iter().map(|l| (l.clone(), Vec::new())).collect();

    for item in items {
        let key = label(item);
        match groups.iter().position(|(l, _)| l == key) {
            Some(idx) => groups[idx].1.push(item),
            None => groups.push((key.to_string(), vec![item])),
        }
    }

    groups.retain(|(_, members)| !members.is_empty());
    groups
}

/// Trades, mean and median of `best_ev` per horizon.
#[must_use]
pub fn summarize_ev(records: &[EvRecord], order: &[String]) -> Vec<HorizonSummary> {
    group_by_label(records, |r| r.horizon.as_str(), order)
        .into_iter()
        .map(|(horizon, members)| {
            let evs: Vec<f64> = members.iter().map(|r| r.best_ev).collect();
            HorizonSummary {
                horizon,
                trades: evs.len(),
                avg_ev: mean(&evs),
                med_ev: median(&evs).unwrap_or_default(),
            }
        })
        .collect()
}

/// Correct, total and hit-rate per horizon.
#[must_use]
pub fn summarize_accuracy(records: &[AccuracyRecord], order: &[String]) -> Vec<AccuracySummary> {
    group_by_label(records, |r| r.horizon.as_str(), order)
        .into_iter()
        .map(|(horizon, members)| {
            let total = members.len();
            let correct = members.iter().filter(|r| r.correct).count();
            AccuracySummary {
                horizon,
                correct,
                total,
                accuracy: correct as f64 / total as f64,
            }
        })
        .collect()
}
