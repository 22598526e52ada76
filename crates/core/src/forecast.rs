//! Forecast chart series.
//!
//! Samples a goal's window at a fixed step and pairs the straight-line
//! target pace with the linear projection from the current run rate.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use crate::engine::{compute_progress, date_start, days_between};
use crate::goal::Goal;
use crate::Time;

/// Upper bound on the samples in one series, end date included.
pub const MAX_POINTS: usize = 1_000;

/// One sample of the forecast chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Sample date
    pub date: NaiveDate,
    /// Value needed by this date to finish exactly on target
    pub target_pace: f64,
    /// The current value, placed on the latest sample not after today
    pub actual: Option<f64>,
    /// Run-rate projection, for samples from today onwards
    pub projected: Option<f64>,
}

/// Build the forecast series from start date through end date.
///
/// `step_days` below 1 is treated as 1. The end date is always sampled.
/// Windows too long for [`MAX_POINTS`] samples at that step get a wider one.
pub fn forecast_series(goal: &Goal, now: Time, step_days: u32) -> Vec<ForecastPoint> {
    let progress = compute_progress(goal, now);
    let span = (goal.end_date - goal.start_date).num_days().max(0) as u64;
    let step = u64::from(step_days.max(1)).max(span.div_ceil(MAX_POINTS as u64 - 2));

    let mut offsets: Vec<u64> = (0..=span).step_by(step as usize).collect();
    if offsets.last() != Some(&span) {
        offsets.push(span);
    }

    let today = now.date_naive();
    let daily_rate = (progress.time_elapsed > 0)
        .then(|| goal.current_value / progress.time_elapsed as f64);

    let dates: Vec<NaiveDate> = offsets
        .iter()
        .filter_map(|offset| goal.start_date.checked_add_days(Days::new(*offset)))
        .collect();
    let actual_at = dates.iter().rposition(|date| *date <= today);

    dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let elapsed = (*date - goal.start_date).num_days() as f64;
            let projected = match daily_rate {
                Some(rate) if *date >= today => {
                    let ahead = days_between(now, date_start(*date)).max(0) as f64;
                    Some(goal.current_value + rate * ahead)
                }
                _ => None,
            };
            ForecastPoint {
                date: *date,
                target_pace: goal.target_value * elapsed / progress.days_total as f64,
                actual: (Some(i) == actual_at).then_some(goal.current_value),
                projected,
            }
        })
        .collect()
}
