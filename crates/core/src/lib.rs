//! Goalpace core data models.
//!
//! This crate defines the goal and territory records, the progress engine
//! that classifies how a goal is pacing against its date window, and the
//! forecast series used by charts.

#![warn(missing_docs)]

// Core identities
mod id;
mod error;

// Records
mod goal;
mod territory;

// Progress math
pub mod engine;
pub mod policy;
pub mod forecast;

// Configuration
mod config;

// Re-exports
pub use id::*;
pub use error::{CoreError, Result};

pub use goal::{
    Goal, NewGoal, GoalUpdate, GoalFilter, GoalPeriod, GoalMetric, GoalStatus, GoalProgress,
};
pub use territory::{Territory, NewTerritory, TerritoryUpdate};

pub use engine::{
    compute_progress, compute_progress_with, compute_progress_now, days_between, date_start,
    Clock, SystemClock, FixedClock,
};
pub use policy::{
    StatusPolicy, StatusInputs, PolicyKind, ThresholdPolicy, ScheduleVariancePolicy, DeadlinePolicy,
};
pub use forecast::{forecast_series, ForecastPoint};
pub use config::GoalpaceConfig;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
