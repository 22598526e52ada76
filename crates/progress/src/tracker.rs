//! Progress tracking service.

use std::sync::Arc;
use async_trait::async_trait;
use goalpace_core::{
    compute_progress_with, forecast_series, Clock, ForecastPoint, Goal, GoalFilter, GoalId,
    GoalProgress, PolicyKind, StatusPolicy, SystemClock, Time,
};
use goalpace_storage::{Result, Storage};
use serde::Serialize;
use tracing::debug;
use crate::dashboard::{DashboardSummary, TerritorySummary};

/// Progress tracking service.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Get goal progress, `None` if the goal does not exist.
    async fn goal_progress(&self, goal_id: GoalId) -> Result<Option<GoalProgress>>;

    /// Take a progress snapshot of the goals matching `filter`.
    async fn snapshot(&self, filter: &GoalFilter) -> Result<ProgressSnapshot>;

    /// Summarize the goals matching `filter`.
    async fn dashboard(&self, filter: &GoalFilter) -> Result<DashboardSummary>;

    /// One dashboard per territory, plus unassigned goals if there are any.
    async fn territory_summary(&self) -> Result<Vec<TerritorySummary>>;

    /// Forecast chart series for a goal, `None` if the goal does not exist.
    async fn forecast(&self, goal_id: GoalId, step_days: u32) -> Result<Option<Vec<ForecastPoint>>>;
}

/// A snapshot of progress at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    /// When snapshot was taken
    pub timestamp: Time,

    /// Status policy that classified the goals
    pub policy: &'static str,

    /// Goals with their progress
    pub goals: Vec<(Goal, GoalProgress)>,
}

/// Basic progress tracker implementation.
///
/// Every goal it reports on is classified with the same clock and policy.
pub struct BasicProgressTracker<S: Storage> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: PolicyKind,
}

impl<S: Storage> BasicProgressTracker<S> {
    /// Create a new progress tracker using wall-clock time and the canonical policy.
    pub fn new(storage: S) -> Self {
        Self {
            storage: Arc::new(storage),
            clock: Arc::new(SystemClock),
            policy: PolicyKind::default(),
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the status policy.
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    fn progress_at(&self, goal: &Goal, now: Time) -> GoalProgress {
        compute_progress_with(goal, now, &self.policy)
    }
}

#[async_trait]
impl<S: Storage + 'static> ProgressTracker for BasicProgressTracker<S> {
    async fn goal_progress(&self, goal_id: GoalId) -> Result<Option<GoalProgress>> {
        let goal = self.storage.load_goal(goal_id).await?;
        let now = self.clock.now();
        Ok(goal.map(|g| self.progress_at(&g, now)))
    }

    async fn snapshot(&self, filter: &GoalFilter) -> Result<ProgressSnapshot> {
        let goals = self.storage.list_goals(filter).await?;
        // One clock reading for the whole snapshot
        let now = self.clock.now();
        let goals: Vec<_> = goals
            .into_iter()
            .map(|g| {
                let progress = self.progress_at(&g, now);
                (g, progress)
            })
            .collect();
        debug!("Snapshot of {} goals with {} policy", goals.len(), self.policy.name());

        Ok(ProgressSnapshot {
            timestamp: now,
            policy: self.policy.name(),
            goals,
        })
    }

    async fn dashboard(&self, filter: &GoalFilter) -> Result<DashboardSummary> {
        let snapshot = self.snapshot(filter).await?;
        Ok(DashboardSummary::from_entries(&snapshot.goals))
    }

    async fn territory_summary(&self) -> Result<Vec<TerritorySummary>> {
        let territories = self.storage.list_territories().await?;
        let snapshot = self.snapshot(&GoalFilter::default()).await?;

        let mut summaries = Vec::with_capacity(territories.len() + 1);
        for territory in territories {
            let entries: Vec<_> = snapshot
                .goals
                .iter()
                .filter(|(g, _)| g.territory_id == Some(territory.id))
                .cloned()
                .collect();
            summaries.push(TerritorySummary {
                territory: Some(territory),
                dashboard: DashboardSummary::from_entries(&entries),
            });
        }

        // Goals pointing at a territory that no longer exists count as unassigned
        let unassigned: Vec<_> = snapshot
            .goals
            .iter()
            .filter(|(g, _)| {
                g.territory_id.map_or(true, |id| {
                    !summaries
                        .iter()
                        .any(|s| s.territory.as_ref().map(|t| t.id) == Some(id))
                })
            })
            .cloned()
            .collect();
        if !unassigned.is_empty() {
            summaries.push(TerritorySummary {
                territory: None,
                dashboard: DashboardSummary::from_entries(&unassigned),
            });
        }

        Ok(summaries)
    }

    async fn forecast(&self, goal_id: GoalId, step_days: u32) -> Result<Option<Vec<ForecastPoint>>> {
        let goal = self.storage.load_goal(goal_id).await?;
        let now = self.clock.now();
        Ok(goal.map(|g| forecast_series(&g, now, step_days)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use goalpace_core::{
        FixedClock, GoalStatus, NewGoal, NewTerritory, ScheduleVariancePolicy, Territory,
        TerritoryId,
    };
    use goalpace_storage::MemoryStorage;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(current: f64, territory_id: Option<TerritoryId>) -> Goal {
        Goal::new(NewGoal {
            title: format!("goal at {}", current),
            description: String::new(),
            metric: Default::default(),
            period: Default::default(),
            target_value: 100.0,
            current_value: current,
            start_date: ymd(2024, 1, 1),
            end_date: ymd(2024, 1, 11),
            territory_id,
        })
    }

    async fn tracker_with(goals: &[Goal], territories: &[Territory]) -> BasicProgressTracker<MemoryStorage> {
        let mut storage = MemoryStorage::new();
        for g in goals {
            storage.save_goal(g).await.unwrap();
        }
        for t in territories {
            storage.save_territory(t).await.unwrap();
        }
        BasicProgressTracker::new(storage).with_clock(Arc::new(FixedClock::on(ymd(2024, 1, 6))))
    }

    #[tokio::test]
    async fn test_goal_progress_uses_clock() {
        let g = goal(50.0, None);
        let tracker = tracker_with(&[g.clone()], &[]).await;

        let progress = tracker.goal_progress(g.id).await.unwrap().unwrap();
        assert_eq!(progress.time_elapsed, 5);
        assert_eq!(progress.status, GoalStatus::OnTrack);

        assert!(tracker.goal_progress(GoalId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_policy_applies_to_all_goals() {
        // 18 points behind: at_risk canonically, behind under schedule variance
        let goals = [goal(32.0, None), goal(31.0, None)];
        let tracker = tracker_with(&goals, &[])
            .await
            .with_policy(PolicyKind::ScheduleVariance(ScheduleVariancePolicy::default()));

        let snapshot = tracker.snapshot(&GoalFilter::default()).await.unwrap();
        assert_eq!(snapshot.policy, "schedule_variance");
        assert!(snapshot.goals.iter().all(|(_, p)| p.status == GoalStatus::Behind));
    }

    #[tokio::test]
    async fn test_dashboard() {
        let goals = [goal(100.0, None), goal(10.0, None)];
        let tracker = tracker_with(&goals, &[]).await;

        let dashboard = tracker.dashboard(&GoalFilter::default()).await.unwrap();
        assert_eq!(dashboard.total_goals, 2);
        assert_eq!(dashboard.count(GoalStatus::Completed), 1);
        assert_eq!(dashboard.needs_attention, vec![goals[1].id]);
    }

    #[tokio::test]
    async fn test_territory_summary_buckets() {
        let west = Territory::new(NewTerritory { name: "West".to_string(), ..Default::default() });
        let empty = Territory::new(NewTerritory { name: "Empty".to_string(), ..Default::default() });
        let goals = [
            goal(60.0, Some(west.id)),
            goal(20.0, Some(west.id)),
            goal(5.0, None),
            goal(5.0, Some(TerritoryId::new())),
        ];
        let tracker = tracker_with(&goals, &[west.clone(), empty.clone()]).await;

        let summaries = tracker.territory_summary().await.unwrap();
        assert_eq!(summaries.len(), 3);

        assert_eq!(summaries[0].territory.as_ref().map(|t| t.id), Some(empty.id));
        assert_eq!(summaries[0].dashboard.total_goals, 0);

        assert_eq!(summaries[1].territory.as_ref().map(|t| t.id), Some(west.id));
        assert_eq!(summaries[1].dashboard.total_goals, 2);
        assert_eq!(summaries[1].dashboard.total_current, 80.0);

        assert!(summaries[2].territory.is_none());
        assert_eq!(summaries[2].dashboard.total_goals, 2);
    }

    #[tokio::test]
    async fn test_forecast() {
        let g = goal(50.0, None);
        let tracker = tracker_with(&[g.clone()], &[]).await;

        let series = tracker.forecast(g.id, 5).await.unwrap().unwrap();
        let dates: Vec<_> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![ymd(2024, 1, 1), ymd(2024, 1, 6), ymd(2024, 1, 11)]);
        assert_eq!(series[1].actual, Some(50.0));
        assert_eq!(series[2].projected, Some(100.0));

        assert!(tracker.forecast(GoalId::new(), 5).await.unwrap().is_none());
    }
}
