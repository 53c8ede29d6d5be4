//! Leader EV backtest command.
//!
//! Lists recently resolved markets, snapshots each at the configured horizons
//! and reports fee-adjusted EV (or leader accuracy) per horizon. Markets and
//! histories come from Polymarket unless `--markets-file` and
//! `--history-file` are given for an offline replay.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use leader_ev_backtest::binary::{
    AccuracySummary, BacktestOutcome, BacktestReport, EvDistribution, FeeTier, HorizonSummary,
    LeaderBacktest, RunStats, Summary,
};
use leader_ev_backtest::{
    save_records_csv, save_summary_csv, FixtureHistory, HistorySource, MarketSource, StaticMarkets,
};
use leader_ev_core::{AppConfig, BacktestConfig, EvaluationMode, HorizonConfig};
use leader_ev_polymarket::{ClobClient, GammaClient};

use super::OutputFormat;

/// Arguments for the backtest command.
#[derive(Args, Debug, Clone, Default)]
pub struct BacktestArgs {
    /// Search keyword forwarded to the market listing
    #[arg(long)]
    pub keyword: Option<String>,

    /// Maximum number of markets to evaluate
    #[arg(long)]
    pub max_markets: Option<usize>,

    /// Proportional fee on the payout term (e.g. 0.02)
    #[arg(long, conflicts_with = "fee_tier")]
    pub fee: Option<f64>,

    /// Fee tier: tier0, tier1, tier2, tier3, maker
    #[arg(long)]
    pub fee_tier: Option<String>,

    /// Only markets that ended within this many days
    #[arg(long)]
    pub lookback_days: Option<i64>,

    /// Weight of the historical-accuracy prior in log-odds space
    #[arg(long)]
    pub blend_weight: Option<f64>,

    /// Horizon as label=duration (e.g. 10d=10d, short=36h); repeatable, replaces configured horizons
    #[arg(long = "horizon")]
    pub horizons: Vec<String>,

    /// Evaluation mode: ev, accuracy
    #[arg(long)]
    pub mode: Option<String>,

    /// Markets evaluated in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Write detailed records to this CSV file
    #[arg(long)]
    pub output: Option<String>,

    /// Write the per-horizon summary to this CSV file
    #[arg(long)]
    pub summary_output: Option<String>,

    /// Replay listings from a JSON file instead of the Gamma API
    #[arg(long, requires = "history_file")]
    pub markets_file: Option<String>,

    /// Replay histories from a token_id,t,p CSV file instead of the CLOB API
    #[arg(long, requires = "markets_file")]
    pub history_file: Option<String>,
}

/// Parses fee tier from string.
fn parse_fee_tier(s: &str) -> Result<FeeTier> {
    s.parse::<FeeTier>().map_err(|e| anyhow!(e))
}

/// Applies command-line overrides on top of the loaded config.
pub fn apply_overrides(mut config: BacktestConfig, args: &BacktestArgs) -> Result<BacktestConfig> {
    if let Some(keyword) = &args.keyword {
        config = config.with_keyword(keyword.clone());
    }
    if let Some(max_markets) = args.max_markets {
        config = config.with_max_markets(max_markets);
    }
    if let Some(fee) = args.fee {
        config = config.with_fee(fee);
    }
    if let Some(tier) = &args.fee_tier {
        config = config.with_fee(parse_fee_tier(tier)?.rate());
    }
    if let Some(days) = args.lookback_days {
        config = config.with_lookback_days(days);
    }
    if let Some(weight) = args.blend_weight {
        config = config.with_blend_weight(weight);
    }
    if !args.horizons.is_empty() {
        let horizons = args
            .horizons
            .iter()
            .map(|h| HorizonConfig::parse(h))
            .collect::<Result<Vec<_>, _>>()?;
        config = config.with_horizons(horizons);
    }
    if let Some(mode) = &args.mode {
        config = config.with_mode(mode.parse::<EvaluationMode>()?);
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }

    config.validate()?;
    Ok(config)
}

type Sources = (Box<dyn MarketSource>, Box<dyn HistorySource>);

fn build_sources(args: &BacktestArgs, app: &AppConfig) -> Result<Sources> {
    match (&args.markets_file, &args.history_file) {
        (Some(markets_file), Some(history_file)) => {
            let markets = StaticMarkets::from_json(markets_file)?;
            let history = FixtureHistory::from_csv(history_file)?;
            tracing::info!(
                markets = markets.len(),
                tokens = history.token_count(),
                "Replaying fixtures"
            );
            Ok((Box::new(markets), Box::new(history)))
        }
        _ => Ok((
            Box::new(GammaClient::from_config(&app.polymarket)?),
            Box::new(ClobClient::from_config(&app.polymarket)?),
        )),
    }
}

/// Message printed when no market produced a record.
#[must_use]
pub fn no_data_message(lookback_days: i64) -> String {
    format!("No qualifying snapshots found in the last {lookback_days} days.")
}

fn format_stats(stats: &RunStats) -> String {
    let mut output = String::new();
    output.push_str("RUN STATS\n");
    output.push_str("---------------------------------------------------------------\n");
    output.push_str(&format!("Markets listed:      {}\n", stats.markets_listed));
    output.push_str(&format!("Outside lookback:    {}\n", stats.outside_lookback));
    output.push_str(&format!("Over cap:            {}\n", stats.over_cap));
    output.push_str(&format!("Invalid listings:    {}\n", stats.invalid_listings));
    output.push_str(&format!("Markets evaluated:   {}\n", stats.markets_evaluated));
    output.push_str(&format!(
        "Skipped markets:     {} (empty history {}, fetch errors {}, no alignment {})\n",
        stats.markets_skipped(),
        stats.empty_history,
        stats.fetch_errors,
        stats.empty_alignment
    ));
    output.push_str(&format!("Horizons skipped:    {}\n", stats.horizons_skipped));
    output.push_str(&format!("Records:             {}\n", stats.records));
    output
}

fn format_ev_table(horizons: &[HorizonSummary]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<10} {:>8} {:>10} {:>10}\n",
        "horizon", "trades", "avg_EV", "med_EV"
    ));
    for h in horizons {
        output.push_str(&format!(
            "{:<10} {:>8} {:>10.4} {:>10.4}\n",
            h.horizon, h.trades, h.avg_ev, h.med_ev
        ));
    }
    output
}

fn format_distribution(d: &EvDistribution) -> String {
    let std = d
        .std
        .map_or_else(|| "n/a".to_string(), |s| format!("{s:.4}"));

    let mut output = String::new();
    output.push_str(&format!("count   {}\n", d.count));
    output.push_str(&format!("mean    {:.4}\n", d.mean));
    output.push_str(&format!("std     {std}\n"));
    output.push_str(&format!("min     {:.4}\n", d.min));
    output.push_str(&format!("25%     {:.4}\n", d.p25));
    output.push_str(&format!("50%     {:.4}\n", d.median));
    output.push_str(&format!("75%     {:.4}\n", d.p75));
    output.push_str(&format!("max     {:.4}\n", d.max));
    output
}

fn format_accuracy_table(horizons: &[AccuracySummary]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<10} {:>8} {:>8} {:>10}\n",
        "horizon", "correct", "total", "accuracy"
    ));
    for h in horizons {
        output.push_str(&format!(
            "{:<10} {:>8} {:>8} {:>9.1}%\n",
            h.horizon,
            h.correct,
            h.total,
            h.accuracy * 100.0
        ));
    }
    output
}

fn format_fee(config: &BacktestConfig, tier: Option<FeeTier>) -> String {
    match tier {
        Some(tier) => format!("{:.2}% ({tier})", tier.rate_percent()),
        None => format!("{:.2}%", config.fee * 100.0),
    }
}

/// Formats the backtest results as a text report.
fn format_text_report(
    report: &BacktestReport,
    config: &BacktestConfig,
    tier: Option<FeeTier>,
) -> String {
    let mut output = String::new();

    // Header
    output.push('\n');
    output.push_str("===============================================================\n");
    output.push_str("                  LEADER EV BACKTEST RESULTS                   \n");
    output.push_str("===============================================================\n");
    output.push_str(&format!("Mode:           {}\n", report.mode));
    output.push_str(&format!("Lookback:       {} days (UTC)\n", config.lookback_days));
    output.push_str(&format!("Fee:            {}\n", format_fee(config, tier)));
    output.push_str(&format!("Blend weight:   {:.2}\n", config.blend_weight));
    let labels: Vec<&str> = config.horizons.iter().map(|h| h.label.as_str()).collect();
    output.push_str(&format!("Horizons:       {}\n", labels.join(", ")));
    output.push('\n');

    output.push_str(&format_stats(&report.stats));
    output.push('\n');

    output.push_str("SUMMARY BY HORIZON\n");
    output.push_str("---------------------------------------------------------------\n");
    match &report.summary {
        Summary::Ev {
            horizons,
            distribution,
        } => {
            output.push_str(&format_ev_table(horizons));
            output.push('\n');
            output.push_str("BEST EV DISTRIBUTION\n");
            output.push_str("---------------------------------------------------------------\n");
            output.push_str(&format_distribution(distribution));
        }
        Summary::Accuracy { horizons } => {
            output.push_str(&format_accuracy_table(horizons));
        }
    }

    output.push_str("===============================================================\n");
    output
}

fn render_no_data(stats: &RunStats, lookback_days: i64, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "{}\n\n{}",
            no_data_message(lookback_days),
            format_stats(stats)
        )),
        OutputFormat::Json => {
            let body = serde_json::json!({
                "status": "no_qualifying_data",
                "message": no_data_message(lookback_days),
                "stats": stats,
            });
            Ok(format!("{}\n", serde_json::to_string_pretty(&body)?))
        }
    }
}

fn write_csv_outputs(report: &BacktestReport, args: &BacktestArgs) -> Result<()> {
    if let Some(path) = &args.output {
        save_records_csv(&report.records, path)?;
        tracing::info!(path = %path, records = report.records.len(), "Wrote detailed records");
    }
    if let Some(path) = &args.summary_output {
        save_summary_csv(&report.summary, path)?;
        tracing::info!(path = %path, "Wrote horizon summary");
    }
    Ok(())
}

/// Runs the backtest with `now` as the end of the lookback window and
/// returns the rendered report.
async fn execute(args: &BacktestArgs, app: &AppConfig, now: DateTime<Utc>) -> Result<String> {
    let format = OutputFormat::parse(&args.format)?;
    let config = apply_overrides(app.backtest.clone(), args)?;
    let tier = args.fee_tier.as_deref().map(parse_fee_tier).transpose()?;

    tracing::info!(
        mode = %config.mode,
        fee = config.fee,
        lookback_days = config.lookback_days,
        max_markets = config.max_markets,
        horizons = config.horizons.len(),
        "Running leader EV backtest"
    );

    let (markets, history) = build_sources(args, app)?;
    let engine = LeaderBacktest::new(config.clone(), history)?;

    let report = match engine.run_at(&markets, now).await {
        BacktestOutcome::Completed(report) => report,
        BacktestOutcome::NoQualifyingData(stats) => {
            tracing::warn!(
                listed = stats.markets_listed,
                evaluated = stats.markets_evaluated,
                "No qualifying data"
            );
            return render_no_data(&stats, config.lookback_days, format);
        }
    };

    write_csv_outputs(&report, args)?;

    match format {
        OutputFormat::Text => Ok(format_text_report(&report, &config, tier)),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&report)?)),
    }
}

/// Runs the backtest command.
pub async fn run_backtest(args: BacktestArgs, app: AppConfig) -> Result<()> {
    let output = execute(&args, &app, Utc::now()).await?;
    print!("{output}");
    Ok(())
}
