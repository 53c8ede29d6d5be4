//! Prints the normalized CLOB price history of one outcome token.

use anyhow::Result;
use clap::Args;

use leader_ev_backtest::binary::{normalize, PricePoint};
use leader_ev_core::AppConfig;
use leader_ev_polymarket::ClobClient;

use super::OutputFormat;

/// Arguments for the history command.
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// CLOB token id of the outcome
    pub token_id: String,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

fn format_history(token_id: &str, series: &[PricePoint]) -> String {
    let mut output = String::new();
    output.push_str(&format!("Token: {token_id}\n"));

    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        output.push_str(&format!(
            "Range: {} .. {}\n",
            first.timestamp.to_rfc3339(),
            last.timestamp.to_rfc3339()
        ));
    }
    output.push('\n');
    output.push_str(&format!("{:<28} {:>8}\n", "timestamp", "price"));

    for point in series {
        output.push_str(&format!(
            "{:<28} {:>8.4}\n",
            point.timestamp.to_rfc3339(),
            point.price
        ));
    }

    output.push_str(&format!("\n{} points\n", series.len()));
    output
}

/// Runs the history command.
pub async fn run_history(args: HistoryArgs, app: AppConfig) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let client = ClobClient::from_config(&app.polymarket)?;

    let rows = client.fetch_history(&args.token_id).await;
    let series = normalize(&rows);

    tracing::info!(
        token_id = %args.token_id,
        raw = rows.len(),
        kept = series.len(),
        "Fetched price history"
    );

    match format {
        OutputFormat::Text => print!("{}", format_history(&args.token_id, &series)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series)?),
    }

    Ok(())
}
