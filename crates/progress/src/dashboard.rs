//! Dashboard aggregation over computed goal progress.

use std::collections::HashMap;
use goalpace_core::{Goal, GoalId, GoalProgress, GoalStatus, Territory};
use serde::Serialize;

/// Roll-up of a set of goals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Number of goals
    pub total_goals: usize,
    /// Goals per status
    pub by_status: HashMap<GoalStatus, usize>,
    /// Sum of targets
    pub total_target: f64,
    /// Sum of current values
    pub total_current: f64,
    /// `total_current / total_target` in percent, 0 when there is no target
    pub overall_percentage: f64,
    /// Goals at risk or behind, worst first
    pub needs_attention: Vec<GoalId>,
}

impl DashboardSummary {
    /// Aggregate goals with their progress.
    pub fn from_entries(entries: &[(Goal, GoalProgress)]) -> Self {
        let mut summary = DashboardSummary {
            total_goals: entries.len(),
            ..Default::default()
        };

        for (goal, progress) in entries {
            *summary.by_status.entry(progress.status).or_insert(0) += 1;
            summary.total_target += goal.target_value;
            summary.total_current += goal.current_value;
        }

        if summary.total_target > 0.0 {
            summary.overall_percentage = summary.total_current / summary.total_target * 100.0;
        }

        let mut attention: Vec<&(Goal, GoalProgress)> = entries
            .iter()
            .filter(|(_, p)| p.status.needs_attention())
            .collect();
        // Worse status first, then the larger shortfall against the expected pace
        attention.sort_by(|(_, a), (_, b)| {
            a.status.urgency().cmp(&b.status.urgency()).then_with(|| {
                let gap_a = a.expected_progress - a.percentage;
                let gap_b = b.expected_progress - b.percentage;
                gap_b.total_cmp(&gap_a)
            })
        });
        summary.needs_attention = attention.into_iter().map(|(g, _)| g.id).collect();

        summary
    }

    /// Number of goals with `status`.
    pub fn count(&self, status: GoalStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Dashboard for one territory, or for unassigned goals when `territory` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerritorySummary {
    /// The territory, `None` for the unassigned bucket
    pub territory: Option<Territory>,
    /// Roll-up of its goals
    pub dashboard: DashboardSummary,
}
