//! Point-in-time snapshot selection.
//!
//! A horizon snapshot is the most recent joint observation at or before
//! `final_ts - horizon`, where `final_ts` is the last observation of the
//! market. Nothing after the target instant is ever returned.

use chrono::{DateTime, Duration, Utc};

use super::series::JointObservation;

/// Returns the target instant for `horizon`.
///
/// `None` for an empty sequence or when the subtraction leaves chrono's range.
#[must_use]
pub fn target_time(observations: &[JointObservation], horizon: Duration) -> Option<DateTime<Utc>> {
    observations
        .last()
        .and_then(|last| last.timestamp.checked_sub_signed(horizon))
}

/// Selects the last observation with `timestamp <= final_ts - horizon`.
///
/// `observations` must be time-ascending (as produced by `align`). Returns
/// `None` when the history does not reach back far enough. With duplicate
/// timestamps at the target, the last of the tied rows is selected.
#[must_use]
pub fn snapshot(observations: &[JointObservation], horizon: Duration) -> Option<&JointObservation> {
    let target = target_time(observations, horizon)?;
    let idx = observations.partition_point(|obs| obs.timestamp <= target);
    idx.checked_sub(1).map(|i| &observations[i])
}
