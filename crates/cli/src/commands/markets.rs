//! Lists recently closed binary markets from the Gamma API.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use leader_ev_backtest::market::{lookback_cutoff, retain_recent};
use leader_ev_backtest::{Market, MarketListing};
use leader_ev_core::{AppConfig, ConfigError, MAX_LOOKBACK_DAYS};
use leader_ev_polymarket::GammaClient;

use super::{truncate, OutputFormat};

const TITLE_WIDTH: usize = 60;

/// Arguments for the markets command.
#[derive(Args, Debug, Clone)]
pub struct MarketsArgs {
    /// Search keyword forwarded to the market listing
    #[arg(long)]
    pub keyword: Option<String>,

    /// Number of listings requested (defaults to polymarket.listing_limit)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Only markets that ended within this many days (defaults to backtest.lookback_days)
    #[arg(long)]
    pub lookback_days: Option<i64>,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

fn format_markets_table(markets: &[Market]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<18} {:<60} {:<16} {:<30}\n",
        "end_time", "title", "outcomes", "token_ids"
    ));
    output.push_str(&format!("{}\n", "-".repeat(127)));

    for market in markets {
        let end = market
            .end_time
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        let outcomes = format!(
            "{} / {}",
            market.outcome_labels[0], market.outcome_labels[1]
        );
        let tokens = format!("{}, {}", market.token_ids[0], market.token_ids[1]);
        output.push_str(&format!(
            "{:<18} {:<60} {:<16} {:<30}\n",
            end,
            truncate(&market.title, TITLE_WIDTH),
            truncate(&outcomes, 16),
            truncate(&tokens, 30)
        ));
    }

    output.push_str(&format!("\n{} markets\n", markets.len()));
    output
}

/// Binary markets among `listings` that ended within `lookback_days` of `now`.
fn recent_markets(
    listings: Vec<MarketListing>,
    now: DateTime<Utc>,
    lookback_days: i64,
) -> Result<Vec<Market>> {
    if !(1..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
        bail!(ConfigError::InvalidLookback(lookback_days));
    }

    Ok(retain_recent(listings, lookback_cutoff(now, lookback_days))
        .iter()
        .filter_map(MarketListing::to_market)
        .collect())
}

/// Runs the markets command.
pub async fn run_markets(args: MarketsArgs, app: AppConfig) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let limit = args.limit.unwrap_or(app.polymarket.listing_limit);
    let lookback_days = args.lookback_days.unwrap_or(app.backtest.lookback_days);

    let client = GammaClient::from_config(&app.polymarket)?;
    let listings = client
        .list_closed_markets(args.keyword.as_deref(), limit)
        .await?;

    let markets = recent_markets(listings, Utc::now(), lookback_days)?;

    tracing::info!(
        markets = markets.len(),
        lookback_days,
        "Listed closed binary markets"
    );

    match format {
        OutputFormat::Text => print!("{}", format_markets_table(&markets)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&markets)?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn table_lists_each_market() {
        let mut market = Market::new("Will it rain in Paris tomorrow?", ["Yes", "No"], ["1", "2"]);
        market.end_time = Some(Utc.with_ymd_and_hms(2026, 10, 1, 12, 30, 0).unwrap());

        let table = format_markets_table(&[market, Market::new("Team A vs Team B", ["A", "B"], ["3", "4"])]);

        assert!(table.contains("2026-10-01 12:30"));
        assert!(table.contains("Will it rain in Paris tomorrow?"));
        assert!(table.contains("Yes / No"));
        assert!(table.contains("1, 2"));
        assert!(table.contains("2 markets"));
    }

    #[test]
    fn table_truncates_long_titles() {
        let title = "x".repeat(100);
        let table = format_markets_table(&[Market::new(title.clone(), ["Yes", "No"], ["1", "2"])]);
        assert!(!table.contains(&title));
        assert!(table.contains("..."));
    }

    fn listing(question: &str, end: &str) -> MarketListing {
        serde_json::from_value(serde_json::json!({
            "question": question,
            "clobTokenIds": "[\"1\", \"2\"]",
            "endDate": end,
        }))
        .unwrap()
    }

    #[test]
    fn recent_markets_applies_window() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        let listings = vec![
            listing("recent", "2026-10-10T00:00:00Z"),
            listing("old", "2026-01-01T00:00:00Z"),
        ];

        let markets = recent_markets(listings, now, 30).unwrap();
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].title, "recent");
    }

    #[test]
    fn recent_markets_rejects_out_of_range_window() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        let listings = vec![listing("recent", "2026-10-10T00:00:00Z")];

        let err = recent_markets(listings.clone(), now, i64::MAX / 2).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidLookback(_))
        ));
        assert!(recent_markets(listings, now, 0).is_err());
    }
}
