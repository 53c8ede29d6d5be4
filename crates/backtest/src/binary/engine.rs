//! Horizon backtest engine.
//!
//! Drives the run through its phases:
//!
//! ```text
//! FetchingMarkets -> PerMarketLoop -> PerHorizonLoop -> Aggregating -> Done
//! ```
//!
//! Every per-item failure degrades to a skip: a listing-service error yields
//! no markets, a history error or empty alignment skips the market, and a
//! horizon the history does not reach skips that horizon. Skips are counted
//! in `RunStats`. An empty record collection is reported as
//! `BacktestOutcome::NoQualifyingData` rather than as a summary of nothing.
//!
//! # Example
//!
//! ```ignore
//! let engine = LeaderBacktest::new(BacktestConfig::default(), clob_client)?;
//! match engine.run(&gamma_client).await {
//!     BacktestOutcome::Completed(report) => println!("{} records", report.records.len()),
//!     BacktestOutcome::NoQualifyingData(stats) => println!("nothing in {} markets", stats.markets_listed),
//! }
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use leader_ev_core::{BacktestConfig, ConfigError, EvaluationMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::blend::ProbabilityBlender;
use super::metrics::{
    summarize_accuracy, summarize_ev, AccuracySummary, EvDistribution, HorizonSummary,
};
use super::outcome::{evaluate_accuracy, evaluate_ev, AccuracyRecord, EvRecord};
use super::pit::snapshot;
use super::series::{align, normalize, RawPricePoint};
use crate::market::{lookback_cutoff, retain_recent, Market};
use crate::source::{HistorySource, MarketSource};

/// Run phase, logged at each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestPhase {
    FetchingMarkets,
    PerMarketLoop,
    PerHorizonLoop,
    Aggregating,
    Done,
}

impl fmt::Display for BacktestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FetchingMarkets => "fetching_markets",
            Self::PerMarketLoop => "per_market_loop",
            Self::PerHorizonLoop => "per_horizon_loop",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Why a market produced no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// One of the outcome histories was empty after normalization.
    EmptyHistory,
    /// The history source returned an error.
    FetchError,
    /// The two histories share no timestamp.
    EmptyAlignment,
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Listings returned by the market source.
    pub markets_listed: usize,
    /// Listings dropped by the recency filter.
    pub outside_lookback: usize,
    /// Recent listings dropped by the market cap.
    pub over_cap: usize,
    /// Listings without two token ids or with non-binary outcomes.
    pub invalid_listings: usize,
    /// Markets whose histories were fetched and evaluated.
    pub markets_evaluated: usize,
    pub empty_history: usize,
    pub fetch_errors: usize,
    pub empty_alignment: usize,
    /// Horizons with no observation at or before their target time.
    pub horizons_skipped: usize,
    pub records: usize,
}

impl RunStats {
    /// Markets that were evaluated but produced no joint history.
    #[must_use]
    pub fn markets_skipped(&self) -> usize {
        self.empty_history + self.fetch_errors + self.empty_alignment
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::EmptyHistory => self.empty_history += 1,
            SkipReason::FetchError => self.fetch_errors += 1,
            SkipReason::EmptyAlignment => self.empty_alignment += 1,
        }
    }
}

/// Flat record collection of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Records {
    Ev(Vec<EvRecord>),
    Accuracy(Vec<AccuracyRecord>),
}

impl Records {
    /// Empty collection for `mode`.
    #[must_use]
    pub fn new(mode: EvaluationMode) -> Self {
        match mode {
            EvaluationMode::Ev => Self::Ev(Vec::new()),
            EvaluationMode::Accuracy => Self::Accuracy(Vec::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Ev(records) => records.len(),
            Self::Accuracy(records) => records.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn mode(&self) -> EvaluationMode {
        match self {
            Self::Ev(_) => EvaluationMode::Ev,
            Self::Accuracy(_) => EvaluationMode::Accuracy,
        }
    }

    /// Appends `other`.
    ///
    /// Both collections must hold the same mode. A mismatch trips a debug
    /// assertion; release builds drop `other` with a warning.
    pub fn append(&mut self, other: Self) {
        match (self, other) {
            (Self::Ev(mine), Self::Ev(theirs)) => mine.extend(theirs),
            (Self::Accuracy(mine), Self::Accuracy(theirs)) => mine.extend(theirs),
            (mine, theirs) => {
                debug_assert!(
                    false,
                    "cannot append {} records to a {} collection",
                    theirs.mode(),
                    mine.mode()
                );
                warn!(
                    dropped = theirs.len(),
                    into = %mine.mode(),
                    from = %theirs.mode(),
                    "Dropping records of a different mode"
                );
            }
        }
    }
}

/// Result of evaluating one market.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvaluation {
    Skipped(SkipReason),
    Evaluated {
        records: Records,
        horizons_skipped: usize,
    },
}

/// Per-horizon aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Summary {
    Ev {
        horizons: Vec<HorizonSummary>,
        distribution: EvDistribution,
    },
    Accuracy {
        horizons: Vec<AccuracySummary>,
    },
}

/// Records, summary and counters of a run with at least one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub mode: EvaluationMode,
    pub records: Records,
    pub summary: Summary,
    pub stats: RunStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BacktestOutcome {
    Completed(BacktestReport),
    /// No market produced a snapshot at any horizon.
    NoQualifyingData(RunStats),
}

impl BacktestOutcome {
    #[must_use]
    pub fn stats(&self) -> &RunStats {
        match self {
            Self::Completed(report) => &report.stats,
            Self::NoQualifyingData(stats) => stats,
        }
    }
}

/// Groups records by horizon and summarizes them.
///
/// `order` is the configured horizon order. Returns `NoQualifyingData` for an
/// empty collection.
#[must_use]
pub fn aggregate(records: Records, order: &[String], mut stats: RunStats) -> BacktestOutcome {
    stats.records = records.len();

    let summary = match &records {
        Records::Ev(ev) => {
            let best: Vec<f64> = ev.iter().map(|r| r.best_ev).collect();
            let Some(distribution) = EvDistribution::describe(&best) else {
                return BacktestOutcome::NoQualifyingData(stats);
            };
            Summary::Ev {
                horizons: summarize_ev(ev, order),
                distribution,
            }
        }
        Records::Accuracy(acc) => {
            if acc.is_empty() {
                return BacktestOutcome::NoQualifyingData(stats);
            }
            Summary::Accuracy {
                horizons: summarize_accuracy(acc, order),
            }
        }
    };

    let mode = records.mode();

    BacktestOutcome::Completed(BacktestReport {
        mode,
        records,
        summary,
        stats,
    })
}

/// Backtest of market-implied leaders at fixed horizons before resolution.
pub struct LeaderBacktest<H> {
    config: BacktestConfig,
    blender: ProbabilityBlender,
    history: H,
}

impl<H: HistorySource> LeaderBacktest<H> {
    /// Creates an engine for a validated configuration.
    ///
    /// # Errors
    /// Returns the first `ConfigError` reported by `BacktestConfig::validate`.
    pub fn new(config: BacktestConfig, history: H) -> Result<Self, ConfigError> {
        config.validate()?;
        let blender = ProbabilityBlender::from_config(&config);

        Ok(Self {
            config,
            blender,
            history,
        })
    }

    #[must_use]
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    fn horizon_order(&self) -> Vec<String> {
        self.config.horizons.iter().map(|h| h.label.clone()).collect()
    }

    /// Runs against markets that ended within `lookback_days` of now.
    pub async fn run<M: MarketSource + ?Sized>(&self, markets: &M) -> BacktestOutcome {
        self.run_at(markets, Utc::now()).await
    }

    /// Runs with an explicit "now" for the recency filter.
    pub async fn run_at<M: MarketSource + ?Sized>(
        &self,
        markets: &M,
        now: DateTime<Utc>,
    ) -> BacktestOutcome {
        let mut stats = RunStats::default();

        info!(
            phase = %BacktestPhase::FetchingMarkets,
            keyword = self.config.keyword.as_deref().unwrap_or(""),
            "Backtest phase"
        );
        let listings = match markets.closed_markets(self.config.keyword.as_deref()).await {
            Ok(listings) => listings,
            Err(e) => {
                warn!(error = %e, "Market listing failed, continuing with no markets");
                Vec::new()
            }
        };
        stats.markets_listed = listings.len();

        let cutoff = lookback_cutoff(now, self.config.lookback_days);
        let recent = retain_recent(listings, cutoff);
        stats.outside_lookback = stats.markets_listed - recent.len();
        stats.over_cap = recent.len().saturating_sub(self.config.max_markets);

        let mut selected = Vec::new();
        for listing in recent.iter().take(self.config.max_markets) {
            match listing.to_market() {
                Some(market) => selected.push(market),
                None => {
                    debug!(market = %listing.title(), "Skipping listing without binary token ids");
                    stats.invalid_listings += 1;
                }
            }
        }

        let (records, run_stats) = self.run_markets(&selected, stats).await;

        info!(phase = %BacktestPhase::Aggregating, records = records.len(), "Backtest phase");
        let outcome = aggregate(records, &self.horizon_order(), run_stats);

        let stats = outcome.stats();
        info!(
            phase = %BacktestPhase::Done,
            listed = stats.markets_listed,
            evaluated = stats.markets_evaluated,
            skipped = stats.markets_skipped(),
            records = stats.records,
            "Backtest phase"
        );

        outcome
    }

    /// Fetches and evaluates `markets`, preserving their order.
    pub async fn run_markets(&self, markets: &[Market], mut stats: RunStats) -> (Records, RunStats) {
        info!(
            phase = %BacktestPhase::PerMarketLoop,
            markets = markets.len(),
            concurrency = self.config.concurrency,
            "Backtest phase"
        );

        let evaluations: Vec<MarketEvaluation> = futures_util::stream::iter(markets)
            .map(|market| self.process_market(market))
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let mut records = Records::new(self.config.mode);
        for evaluation in evaluations {
            stats.markets_evaluated += 1;
            match evaluation {
                MarketEvaluation::Skipped(reason) => stats.record_skip(reason),
                MarketEvaluation::Evaluated {
                    records: market_records,
                    horizons_skipped,
                } => {
                    stats.horizons_skipped += horizons_skipped;
                    records.append(market_records);
                }
            }
        }

        (records, stats)
    }

    async fn process_market(&self, market: &Market) -> MarketEvaluation {
        let [token_1, token_2] = &market.token_ids;

        let rows_1 = match self.fetch(market, token_1).await {
            Some(rows) => rows,
            None => return MarketEvaluation::Skipped(SkipReason::FetchError),
        };
        let rows_2 = match self.fetch(market, token_2).await {
            Some(rows) => rows,
            None => return MarketEvaluation::Skipped(SkipReason::FetchError),
        };

        self.evaluate_market(market, &rows_1, &rows_2)
    }

    async fn fetch(&self, market: &Market, token_id: &str) -> Option<Vec<RawPricePoint>> {
        match self.history.fetch_history(token_id).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!(market = %market.title, token_id, error = %e, "History fetch failed, skipping market");
                None
            }
        }
    }

    /// Evaluates every configured horizon of one market from raw histories.
    #[must_use]
    pub fn evaluate_market(
        &self,
        market: &Market,
        rows_1: &[RawPricePoint],
        rows_2: &[RawPricePoint],
    ) -> MarketEvaluation {
        let series_1 = normalize(rows_1);
        let series_2 = normalize(rows_2);
        if series_1.is_empty() || series_2.is_empty() {
            debug!(market = %market.title, "Skipping market with empty history");
            return MarketEvaluation::Skipped(SkipReason::EmptyHistory);
        }

        let observations = align(&series_1, &series_2);
        let Some(last) = observations.last() else {
            debug!(market = %market.title, "Skipping market with no shared timestamps");
            return MarketEvaluation::Skipped(SkipReason::EmptyAlignment);
        };

        debug!(
            phase = %BacktestPhase::PerHorizonLoop,
            market = %market.title,
            observations = observations.len(),
            "Backtest phase"
        );

        let mut records = Records::new(self.config.mode);
        let mut horizons_skipped = 0;

        for horizon in &self.config.horizons {
            let Some(obs) = horizon
                .lookback()
                .and_then(|lookback| snapshot(&observations, lookback))
            else {
                debug!(market = %market.title, horizon = %horizon.label, "History too short for horizon");
                horizons_skipped += 1;
                continue;
            };

            match &mut records {
                Records::Ev(ev) => ev.push(evaluate_ev(
                    &market.title,
                    &horizon.label,
                    obs,
                    &self.blender,
                    self.config.fee,
                )),
                Records::Accuracy(acc) => {
                    acc.push(evaluate_accuracy(market, &horizon.label, obs, last));
                }
            }
        }

        MarketEvaluation::Evaluated {
            records,
            horizons_skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_provider::{FixtureHistory, StaticMarkets};
    use crate::market::MarketListing;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use leader_ev_core::{HorizonConfig, MAX_LOOKBACK_DAYS, MAX_LOOKBACK_SECS};

    const DAY: i64 = 86_400;

    fn config() -> BacktestConfig {
        BacktestConfig::default().with_horizons(vec![
            HorizonConfig::days("10d", 10),
            HorizonConfig::days("5d", 5),
        ])
    }

    fn daily(prices: &[f64]) -> Vec<RawPricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| RawPricePoint::new(i as i64 * DAY, p))
            .collect()
    }

    fn market() -> Market {
        Market::new("Test market", ["Yes", "No"], ["a", "b"])
    }

    fn engine(config: BacktestConfig) -> LeaderBacktest<FixtureHistory> {
        LeaderBacktest::new(config, FixtureHistory::new()).unwrap()
    }

    struct FailingHistory;

    #[async_trait]
    impl HistorySource for FailingHistory {
        async fn fetch_history(&self, _token_id: &str) -> anyhow::Result<Vec<RawPricePoint>> {
            Err(anyhow!("connection reset"))
        }
    }

    struct FailingMarkets;

    #[async_trait]
    impl MarketSource for FailingMarkets {
        async fn closed_markets(&self, _keyword: Option<&str>) -> anyhow::Result<Vec<MarketListing>> {
            Err(anyhow!("gateway timeout"))
        }
    }

    // ============================================================
    // Construction
    // ============================================================

    #[test]
    fn new_rejects_invalid_config() {
        let result = LeaderBacktest::new(config().with_fee(1.5), FixtureHistory::new());
        assert!(matches!(result, Err(ConfigError::InvalidFee(_))));
    }

    #[test]
    fn new_rejects_out_of_range_windows() {
        let far = HorizonConfig {
            label: "far".to_string(),
            lookback_secs: 100_000_000_000_000,
        };
        let result = LeaderBacktest::new(config().with_horizons(vec![far]), FixtureHistory::new());
        assert!(matches!(result, Err(ConfigError::HorizonTooLong { .. })));

        let result = LeaderBacktest::new(
            config().with_lookback_days(i64::MAX / 2),
            FixtureHistory::new(),
        );
        assert!(matches!(result, Err(ConfigError::InvalidLookback(_))));
    }

    // ============================================================
    // Record collections
    // ============================================================

    #[test]
    fn append_extends_same_mode() {
        let mut records = Records::new(EvaluationMode::Accuracy);
        records.append(Records::new(EvaluationMode::Accuracy));
        assert!(records.is_empty());
        assert_eq!(records.mode(), EvaluationMode::Accuracy);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cannot append accuracy records to a ev collection")]
    fn append_of_other_mode_fails_loudly() {
        let mut records = Records::new(EvaluationMode::Ev);
        records.append(Records::new(EvaluationMode::Accuracy));
    }

    // ============================================================
    // Per-market evaluation
    // ============================================================

    #[test]
    fn evaluate_market_emits_one_record_per_reachable_horizon() {
        let e = engine(config());
        let p1: Vec<f64> = (0..=12).map(|i| 0.5 + f64::from(i) * 0.03).collect();
        let p2: Vec<f64> = p1.iter().map(|p| 1.0 - p).collect();

        let MarketEvaluation::Evaluated {
            records,
            horizons_skipped,
        } = e.evaluate_market(&market(), &daily(&p1), &daily(&p2))
        else {
            panic!("expected evaluation");
        };

        assert_eq!(horizons_skipped, 0);
        let Records::Ev(ev) = records else {
            panic!("expected EV records");
        };
        assert_eq!(ev.len(), 2);
        assert_eq!(ev[0].horizon, "10d");
        assert_eq!(ev[0].snapshot_ts.timestamp(), 2 * DAY);
        assert_eq!(ev[1].horizon, "5d");
        assert_eq!(ev[1].snapshot_ts.timestamp(), 7 * DAY);
        assert!(ev.iter().all(|r| r.leader_price >= r.underdog_price));
    }

    #[test]
    fn short_history_skips_long_horizon() {
        let e = engine(config());
        let MarketEvaluation::Evaluated {
            records,
            horizons_skipped,
        } = e.evaluate_market(&market(), &daily(&[0.6; 7]), &daily(&[0.4; 7]))
        else {
            panic!("expected evaluation");
        };

        assert_eq!(horizons_skipped, 1);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_history_is_skipped() {
        let e = engine(config());
        assert_eq!(
            e.evaluate_market(&market(), &[], &daily(&[0.4; 3])),
            MarketEvaluation::Skipped(SkipReason::EmptyHistory)
        );
    }

    #[test]
    fn disjoint_histories_are_skipped() {
        let e = engine(config());
        let shifted: Vec<RawPricePoint> = (0..3).map(|i| RawPricePoint::new(i * DAY + 1, 0.4)).collect();
        assert_eq!(
            e.evaluate_market(&market(), &daily(&[0.6; 3]), &shifted),
            MarketEvaluation::Skipped(SkipReason::EmptyAlignment)
        );
    }

    #[test]
    fn accuracy_mode_compares_with_final_leader() {
        let e = engine(config().with_mode(EvaluationMode::Accuracy));
        // Outcome 1 leads early, outcome 2 wins at the end.
        let mut p1 = vec![0.7; 12];
        p1.push(0.1);
        let p2: Vec<f64> = p1.iter().map(|p| 1.0 - p).collect();

        let MarketEvaluation::Evaluated { records, .. } =
            e.evaluate_market(&market(), &daily(&p1), &daily(&p2))
        else {
            panic!("expected evaluation");
        };
        let Records::Accuracy(acc) = records else {
            panic!("expected accuracy records");
        };

        assert_eq!(acc.len(), 2);
        assert!(acc.iter().all(|r| !r.correct));
        assert!(acc.iter().all(|r| r.predicted_winner == "Yes" && r.final_winner == "No"));
    }

    // ============================================================
    // Aggregation
    // ============================================================

    #[test]
    fn aggregate_empty_is_no_qualifying_data() {
        let order = vec!["10d".to_string()];
        assert!(matches!(
            aggregate(Records::new(EvaluationMode::Ev), &order, RunStats::default()),
            BacktestOutcome::NoQualifyingData(_)
        ));
        assert!(matches!(
            aggregate(Records::new(EvaluationMode::Accuracy), &order, RunStats::default()),
            BacktestOutcome::NoQualifyingData(_)
        ));
    }

    // ============================================================
    // Full runs
    // ============================================================

    fn listing(question: &str, tokens: [&str; 2], end: &str) -> MarketListing {
        serde_json::from_value(serde_json::json!({
            "question": question,
            "clobTokenIds": tokens,
            "endDate": end,
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-18T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn run_applies_lookback_cap_and_validity() {
        let markets = StaticMarkets::new(vec![
            listing("old", ["o1", "o2"], "2026-01-01T00:00:00Z"),
            listing("good", ["a", "b"], "2026-10-10T00:00:00Z"),
            serde_json::from_value(serde_json::json!({
                "question": "no tokens",
                "endDate": "2026-10-09T00:00:00Z"
            }))
            .unwrap(),
            listing("capped", ["c1", "c2"], "2026-10-08T00:00:00Z"),
        ]);
        let history = FixtureHistory::new()
            .with_rows("a", daily(&[0.7; 12]))
            .with_rows("b", daily(&[0.3; 12]));

        let e = LeaderBacktest::new(config().with_max_markets(2), history).unwrap();
        let BacktestOutcome::Completed(report) = e.run_at(&markets, now()).await else {
            panic!("expected a report");
        };

        assert_eq!(report.stats.markets_listed, 4);
        assert_eq!(report.stats.outside_lookback, 1);
        assert_eq!(report.stats.over_cap, 1);
        assert_eq!(report.stats.invalid_listings, 1);
        assert_eq!(report.stats.markets_evaluated, 1);
        assert_eq!(report.stats.records, 2);
        assert_eq!(report.records.len(), 2);
    }

    #[tokio::test]
    async fn widest_accepted_windows_run_without_overflow() {
        let markets = StaticMarkets::new(vec![listing("good", ["a", "b"], "2026-10-10T00:00:00Z")]);
        let history = FixtureHistory::new()
            .with_rows("a", daily(&[0.7; 12]))
            .with_rows("b", daily(&[0.3; 12]));
        let widest = HorizonConfig {
            label: "max".to_string(),
            lookback_secs: MAX_LOOKBACK_SECS,
        };

        let e = LeaderBacktest::new(
            config()
                .with_lookback_days(MAX_LOOKBACK_DAYS)
                .with_horizons(vec![widest, HorizonConfig::days("5d", 5)]),
            history,
        )
        .unwrap();

        let BacktestOutcome::Completed(report) = e.run_at(&markets, now()).await else {
            panic!("expected a report");
        };
        assert_eq!(report.stats.outside_lookback, 0);
        assert_eq!(report.stats.horizons_skipped, 1);
        assert_eq!(report.records.len(), 1);
    }

    #[tokio::test]
    async fn fetch_errors_skip_markets() {
        let markets = StaticMarkets::new(vec![listing("m", ["a", "b"], "2026-10-10T00:00:00Z")]);
        let e = LeaderBacktest::new(config(), FailingHistory).unwrap();

        let outcome = e.run_at(&markets, now()).await;
        let BacktestOutcome::NoQualifyingData(stats) = outcome else {
            panic!("expected no data");
        };
        assert_eq!(stats.fetch_errors, 1);
        assert_eq!(stats.markets_skipped(), 1);
    }

    #[tokio::test]
    async fn listing_failure_yields_no_data() {
        let e = engine(config());
        let outcome = e.run_at(&FailingMarkets, now()).await;
        assert!(matches!(outcome, BacktestOutcome::NoQualifyingData(ref s) if s.markets_listed == 0));
    }

    #[tokio::test]
    async fn concurrency_preserves_market_order() {
        let mut listings = Vec::new();
        let mut history = FixtureHistory::new();
        for i in 0..6 {
            let (t1, t2) = (format!("y{i}"), format!("n{i}"));
            listings.push(listing(&format!("m{i}"), [t1.as_str(), t2.as_str()], "2026-10-10T00:00:00Z"));
            history = history
                .with_rows(t1, daily(&[0.6; 12]))
                .with_rows(t2, daily(&[0.4; 12]));
        }

        let e = LeaderBacktest::new(config().with_concurrency(4), history).unwrap();
        let BacktestOutcome::Completed(report) = e.run_at(&StaticMarkets::new(listings), now()).await
        else {
            panic!("expected a report");
        };

        let Records::Ev(ev) = report.records else {
            panic!("expected EV records");
        };
        let markets: Vec<&str> = ev.iter().step_by(2).map(|r| r.market.as_str()).collect();
        assert_eq!(markets, vec!["m0", "m1", "m2", "m3", "m4", "m5"]);
    }
}
