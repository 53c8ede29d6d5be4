//! Snapshot evaluation: fee-adjusted EV and leader accuracy.
//!
//! EV assumes a bet that pays 1 on a correct prediction and costs the current
//! price to enter. The fee scales the payout-probability term only, never the
//! entry cost:
//!
//! ```text
//! ev_leader   = p_blend * (1 - fee) - leader_price
//! ev_underdog = (1 - p_blend) * (1 - fee) - (1 - leader_price)
//! ```
//!
//! When both outcomes trade at the same price, outcome 1 is the leader.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blend::ProbabilityBlender;
use super::series::JointObservation;
use crate::market::Market;

/// One of the two outcomes of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    One,
    Two,
}

impl Outcome {
    /// Position in the market's outcome and token arrays.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// The higher-priced outcome; ties go to outcome 1.
    #[must_use]
    pub fn leader_of(obs: &JointObservation) -> Self {
        if obs.price_outcome_1 >= obs.price_outcome_2 {
            Self::One
        } else {
            Self::Two
        }
    }

    /// Label of this outcome in `market`.
    #[must_use]
    pub fn label(self, market: &Market) -> &str {
        &market.outcome_labels[self.index()]
    }
}

/// Side chosen by the EV comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetSide {
    Leader,
    Underdog,
}

impl fmt::Display for BetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leader => write!(f, "leader"),
            Self::Underdog => write!(f, "underdog"),
        }
    }
}

/// A joint observation selected for a horizon, with leader/underdog derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub price_outcome_1: f64,
    pub price_outcome_2: f64,
    pub leader: Outcome,
    pub leader_price: f64,
    pub underdog_price: f64,
}

impl Snapshot {
    #[must_use]
    pub fn from_observation(obs: &JointObservation) -> Self {
        let leader = Outcome::leader_of(obs);
        let (leader_price, underdog_price) = match leader {
            Outcome::One => (obs.price_outcome_1, obs.price_outcome_2),
            Outcome::Two => (obs.price_outcome_2, obs.price_outcome_1),
        };

        Self {
            timestamp: obs.timestamp,
            price_outcome_1: obs.price_outcome_1,
            price_outcome_2: obs.price_outcome_2,
            leader,
            leader_price,
            underdog_price,
        }
    }
}

/// EV of both sides plus the preferred one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvDecision {
    pub ev_leader: f64,
    pub ev_underdog: f64,
    pub best_side: BetSide,
    pub best_ev: f64,
}

/// Computes leader and underdog EV. The leader wins ties between the two EVs.
#[must_use]
pub fn decide(leader_price: f64, p_blend: f64, fee: f64) -> EvDecision {
    let payout = 1.0 - fee;
    let ev_leader = p_blend * payout - leader_price;
    let ev_underdog = (1.0 - p_blend) * payout - (1.0 - leader_price);

    let (best_side, best_ev) = if ev_leader >= ev_underdog {
        (BetSide::Leader, ev_leader)
    } else {
        (BetSide::Underdog, ev_underdog)
    };

    EvDecision {
        ev_leader,
        ev_underdog,
        best_side,
        best_ev,
    }
}

/// One evaluated bet decision.
///
/// Field order is the column order of the detailed CSV report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvRecord {
    pub market: String,
    pub horizon: String,
    pub snapshot_ts: DateTime<Utc>,
    pub leader_price: f64,
    pub underdog_price: f64,
    pub p_blend: f64,
    pub ev_leader: f64,
    pub ev_underdog: f64,
    pub best_side: BetSide,
    pub best_ev: f64,
}

/// Evaluates the EV record of `obs` for one market and horizon.
#[must_use]
pub fn evaluate_ev(
    market: &str,
    horizon: &str,
    obs: &JointObservation,
    blender: &ProbabilityBlender,
    fee: f64,
) -> EvRecord {
    let snapshot = Snapshot::from_observation(obs);
    let p_blend = blender.blend(snapshot.leader_price, horizon);
    let decision = decide(snapshot.leader_price, p_blend, fee);

    EvRecord {
        market: market.to_string(),
        horizon: horizon.to_string(),
        snapshot_ts: snapshot.timestamp,
        leader_price: snapshot.leader_price,
        underdog_price: snapshot.underdog_price,
        p_blend,
        ev_leader: decision.ev_leader,
        ev_underdog: decision.ev_underdog,
        best_side: decision.best_side,
        best_ev: decision.best_ev,
    }
}

/// Whether the snapshot leader was also the leader at the final observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyRecord {
    pub market: String,
    pub horizon: String,
    pub snapshot_ts: DateTime<Utc>,
    pub predicted_winner: String,
    pub final_winner: String,
    pub correct: bool,
}

/// Compares the leader at `snapshot` with the leader at `last`.
#[must_use]
pub fn evaluate_accuracy(
    market: &Market,
    horizon: &str,
    snapshot: &JointObservation,
    last: &JointObservation,
) -> AccuracyRecord {
    let predicted = Outcome::leader_of(snapshot);
    let actual = Outcome::leader_of(last);

    AccuracyRecord {
        market: market.title.clone(),
        horizon: horizon.to_string(),
        snapshot_ts: snapshot.timestamp,
        predicted_winner: predicted.label(market).to_string(),
        final_winner: actual.label(market).to_string(),
        correct: predicted == actual,
    }
}
