use clap::{Parser, Subcommand};
use leader_ev_core::{AppConfig, ConfigLoader, LoggingConfig, DEFAULT_CONFIG_PATH};

mod commands;

use commands::{BacktestArgs, HistoryArgs, MarketsArgs};

#[derive(Parser)]
#[command(name = "leader-ev")]
#[command(
    about = "Backtest whether binary prediction-market leaders are worth betting",
    long_about = None
)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, env = "LEADER_EV_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Config profile overlay (reads <stem>.<profile>.toml next to the config file)
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot recently resolved markets at fixed horizons and evaluate the leader
    Backtest(BacktestArgs),
    /// List recently closed binary markets
    Markets(MarketsArgs),
    /// Print the normalized price history of one outcome token
    History(HistoryArgs),
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let config = match &cli.profile {
        Some(profile) => ConfigLoader::load_with_profile(&cli.config, profile)?,
        None => ConfigLoader::load(&cli.config)?,
    };
    Ok(config)
}

/// Installs the global subscriber. Logs go to stderr so reports on stdout
/// stay machine-readable.
fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_logging(&config.logging);

    tracing::debug!(config = %cli.config, profile = ?cli.profile, "Starting leader-ev");

    match cli.command {
        Commands::Backtest(args) => commands::run_backtest(args, config).await?,
        Commands::Markets(args) => commands::run_markets(args, config).await?,
        Commands::History(args) => commands::run_history(args, config).await?,
    }

    Ok(())
}
