//! CSV output of records and per-horizon summaries.
//!
//! EV records are written with the columns
//! `market, horizon, snapshot_ts, leader_price, underdog_price, p_blend,
//! ev_leader, ev_underdog, best_side, best_ev`; the EV summary with
//! `horizon, trades, avg_ev, med_ev` and the accuracy summary with
//! `horizon, correct, total, accuracy`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::binary::engine::{Records, Summary};

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes one CSV row per record.
///
/// # Errors
/// Returns an error if serialization or the underlying writer fails.
pub fn write_records_csv<W: Write>(records: &Records, writer: W) -> Result<()> {
    match records {
        Records::Ev(rows) => write_rows(writer, rows),
        Records::Accuracy(rows) => write_rows(writer, rows),
    }
}

/// Writes one CSV row per horizon group.
///
/// # Errors
/// Returns an error if serialization or the underlying writer fails.
pub fn write_summary_csv<W: Write>(summary: &Summary, writer: W) -> Result<()> {
    match summary {
        Summary::Ev { horizons, .. } => write_rows(writer, horizons),
        Summary::Accuracy { horizons } => write_rows(writer, horizons),
    }
}

/// Writes the records to a CSV file at `path`.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn save_records_csv(records: &Records, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_records_csv(records, file)
}

/// Writes the summary to a CSV file at `path`.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn save_summary_csv(summary: &Summary, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_summary_csv(summary, file)
}
