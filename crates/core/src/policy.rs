//! Status classification policies.
//!
//! A status is a pure classification of where a goal stands against where
//! it should be by now. Several rules for this exist in the wild; each one
//! is a named policy here so that every caller picks one explicitly.
//! [`ThresholdPolicy`] is the canonical rule.

use serde::{Deserialize, Serialize};
use crate::goal::GoalStatus;

/// The numbers a policy classifies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusInputs {
    /// Percentage of target reached
    pub percentage: f64,
    /// Share of the window elapsed, in percent
    pub expected_progress: f64,
    /// Whole days left in the window
    pub time_remaining: i64,
}

/// A pure goal status classifier.
pub trait StatusPolicy: Send + Sync {
    /// Policy name, for logs and output.
    fn name(&self) -> &'static str;

    /// Classify a goal.
    fn classify(&self, inputs: &StatusInputs) -> GoalStatus;
}

/// Canonical four-state policy based on distance from expected progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    /// Percentage at which the goal counts as completed
    pub completed_at: f64,
    /// Points behind expected progress that make a goal `behind`
    pub behind_margin: f64,
    /// Points behind expected progress that make a goal `at_risk`
    pub at_risk_margin: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            completed_at: 100.0,
            behind_margin: 20.0,
            at_risk_margin: 10.0,
        }
    }
}

impl StatusPolicy for ThresholdPolicy {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn classify(&self, inputs: &StatusInputs) -> GoalStatus {
        let StatusInputs { percentage, expected_progress, .. } = *inputs;
        if percentage >= self.completed_at {
            GoalStatus::Completed
        } else if percentage < expected_progress - self.behind_margin {
            GoalStatus::Behind
        } else if percentage < expected_progress - self.at_risk_margin {
            GoalStatus::AtRisk
        } else {
            GoalStatus::OnTrack
        }
    }
}

/// Three-state schedule variance rule used by the report views.
///
/// Never yields [`GoalStatus::Completed`]: a finished goal is just ahead
/// of schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleVariancePolicy {
    /// Points behind schedule still considered `at_risk` rather than `behind`
    pub tolerance: f64,
}

impl Default for ScheduleVariancePolicy {
    fn default() -> Self {
        Self { tolerance: 15.0 }
    }
}

impl StatusPolicy for ScheduleVariancePolicy {
    fn name(&self) -> &'static str {
        "schedule_variance"
    }

    fn classify(&self, inputs: &StatusInputs) -> GoalStatus {
        let shortfall = inputs.expected_progress - inputs.percentage;
        if shortfall <= 0.0 {
            GoalStatus::OnTrack
        } else if shortfall <= self.tolerance {
            GoalStatus::AtRisk
        } else {
            GoalStatus::Behind
        }
    }
}

/// Dashboard heuristic: healthy above a fixed percentage, urgent near the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlinePolicy {
    /// Percentage at or above which a goal is `on_track` regardless of dates
    pub healthy_at: f64,
    /// Fewer days than this left turns an unhealthy goal `behind`
    pub urgent_days: i64,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            healthy_at: 70.0,
            urgent_days: 7,
        }
    }
}

impl StatusPolicy for DeadlinePolicy {
    fn name(&self) -> &'static str {
        "deadline"
    }

    fn classify(&self, inputs: &StatusInputs) -> GoalStatus {
        if inputs.percentage >= 100.0 {
            GoalStatus::Completed
        } else if inputs.percentage >= self.healthy_at {
            GoalStatus::OnTrack
        } else if inputs.time_remaining < self.urgent_days {
            GoalStatus::Behind
        } else {
            GoalStatus::AtRisk
        }
    }
}

/// Configurable choice of policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyKind {
    /// [`ThresholdPolicy`]
    Threshold(ThresholdPolicy),
    /// [`ScheduleVariancePolicy`]
    ScheduleVariance(ScheduleVariancePolicy),
    /// [`DeadlinePolicy`]
    Deadline(DeadlinePolicy),
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::Threshold(ThresholdPolicy::default())
    }
}

impl PolicyKind {
    /// Pick a policy by name with default parameters.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace('-', "_").as_str() {
            "threshold" => Some(PolicyKind::Threshold(ThresholdPolicy::default())),
            "schedule_variance" => Some(PolicyKind::ScheduleVariance(ScheduleVariancePolicy::default())),
            "deadline" => Some(PolicyKind::Deadline(DeadlinePolicy::default())),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn StatusPolicy {
        match self {
            PolicyKind::Threshold(p) => p as &dyn StatusPolicy,
            PolicyKind::ScheduleVariance(p) => p,
            PolicyKind::Deadline(p) => p,
        }
    }
}

impl StatusPolicy for PolicyKind {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn classify(&self, inputs: &StatusInputs) -> GoalStatus {
        self.inner().classify(inputs)
    }
}
