pub mod binary;
pub mod data_provider;
pub mod market;
pub mod report;
pub mod source;

pub use binary::{
    BacktestOutcome, BacktestReport, BetSide, EvRecord, FeeTier, LeaderBacktest, ProbabilityBlender,
    RawPricePoint, Records, RunStats, Summary,
};
pub use data_provider::{FixtureHistory, StaticMarkets};
pub use market::{Market, MarketListing};
pub use report::{save_records_csv, save_summary_csv, write_records_csv, write_summary_csv};
pub use source::{HistorySource, MarketSource};
