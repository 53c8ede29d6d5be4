//! Polymarket adapters for the leader EV backtest.
//!
//! This crate provides:
//! - `GammaClient`: closed-market listings (`MarketSource`)
//! - `ClobClient`: token price histories (`HistorySource`)
//!
//! # Example
//!
//! ```no_run
//! use leader_ev_backtest::{BacktestOutcome, LeaderBacktest};
//! use leader_ev_core::BacktestConfig;
//! use leader_ev_polymarket::{ClobClient, GammaClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = LeaderBacktest::new(BacktestConfig::default(), ClobClient::new())?;
//!
//!     if let BacktestOutcome::Completed(report) = engine.run(&GammaClient::new()).await {
//!         println!("{} records", report.records.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod clob;
pub mod gamma;
pub mod models;

pub use clob::{ClobClient, HISTORY_QUERY_VARIANTS, POLYMARKET_CLOB_URL};
pub use gamma::{GammaClient, GAMMA_API_URL};
pub use models::{parse_history_row, PricesHistoryResponse};
