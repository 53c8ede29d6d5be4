//! Horizon backtest of binary prediction markets.
//!
//! Normalizes and aligns the two outcome histories of each market, snapshots
//! the joint series at fixed horizons before its final observation, blends the
//! leader price with a historical-accuracy prior and evaluates either the
//! fee-adjusted EV of each side or whether the leader held.

pub mod blend;
pub mod engine;
pub mod fees;
pub mod metrics;
pub mod outcome;
pub mod pit;
pub mod series;

pub use blend::{blend_log_odds, logit, sigmoid, ProbabilityBlender, PROBABILITY_EPSILON};
pub use engine::{
    aggregate, BacktestOutcome, BacktestPhase, BacktestReport, LeaderBacktest, MarketEvaluation,
    Records, RunStats, SkipReason, Summary,
};
pub use fees::FeeTier;
pub use metrics::{median, summarize_accuracy, summarize_ev, AccuracySummary, EvDistribution, HorizonSummary};
pub use outcome::{
    decide, evaluate_accuracy, evaluate_ev, AccuracyRecord, BetSide, EvDecision, EvRecord, Outcome,
    Snapshot,
};
pub use pit::snapshot;
pub use series::{align, normalize, JointObservation, OutcomeSeries, PricePoint, RawPricePoint, RawTimestamp};
