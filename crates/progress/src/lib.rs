//! Progress services.
//!
//! Validated goal and territory management, progress snapshots, dashboards
//! and forecast series.

#![warn(missing_docs)]

pub mod error;
pub mod manager;
pub mod tracker;
pub mod dashboard;

pub use error::{ManagerError, Result};
pub use manager::GoalManager;
pub use tracker::{ProgressTracker, ProgressSnapshot, BasicProgressTracker};
pub use dashboard::{DashboardSummary, TerritorySummary};
