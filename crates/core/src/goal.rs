//! Goal model - a sales target with a date window and progress tracking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::error::{CoreError, Result};
use crate::id::{GoalId, TerritoryId};
use crate::Time;

/// A goal is a numeric target to reach within a calendar window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier
    pub id: GoalId,

    /// Goal title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// What the values count
    pub metric: GoalMetric,

    /// Reporting period
    pub period: GoalPeriod,

    /// Quantity to reach
    pub target_value: f64,

    /// Progress so far
    pub current_value: f64,

    /// First day of the window
    pub start_date: NaiveDate,

    /// Last day of the window
    pub end_date: NaiveDate,

    /// Owning sales territory
    #[serde(default)]
    pub territory_id: Option<TerritoryId>,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

impl Goal {
    /// Create a goal from a creation payload.
    ///
    /// This does not validate; callers run [`Goal::validate`] before saving.
    pub fn new(new: NewGoal) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: GoalId::new(),
            title: new.title,
            description: new.description,
            metric: new.metric,
            period: new.period,
            target_value: new.target_value,
            current_value: new.current_value,
            start_date: new.start_date,
            end_date: new.end_date,
            territory_id: new.territory_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the creation-time invariants.
    ///
    /// The progress engine tolerates all of these being violated, but the
    /// store should never hold such a goal.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::validation("title", "must not be blank"));
        }
        if !self.target_value.is_finite() || self.target_value <= 0.0 {
            return Err(CoreError::validation(
                "target_value",
                format!("must be a positive number, got {}", self.target_value),
            ));
        }
        if !self.current_value.is_finite() || self.current_value < 0.0 {
            return Err(CoreError::validation(
                "current_value",
                format!("must be zero or more, got {}", self.current_value),
            ));
        }
        if self.end_date <= self.start_date {
            return Err(CoreError::validation(
                "end_date",
                format!("{} must be after start date {}", self.end_date, self.start_date),
            ));
        }
        Ok(())
    }

    /// Apply a partial update in place. Timestamps are bumped.
    pub fn apply(&mut self, update: GoalUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(metric) = update.metric {
            self.metric = metric;
        }
        if let Some(period) = update.period {
            self.period = period;
        }
        if let Some(target) = update.target_value {
            self.target_value = target;
        }
        if let Some(current) = update.current_value {
            self.current_value = current;
        }
        if let Some(start) = update.start_date {
            self.start_date = start;
        }
        if let Some(end) = update.end_date {
            self.end_date = end;
        }
        if let Some(territory) = update.territory_id {
            self.territory_id = territory;
        }
        self.updated_at = chrono::Utc::now();
    }

    /// Whether `date` falls inside the goal window (both ends inclusive).
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Payload for creating a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    /// Goal title
    pub title: String,
    /// Detailed description
    #[serde(default)]
    pub description: String,
    /// What the values count
    #[serde(default)]
    pub metric: GoalMetric,
    /// Reporting period
    #[serde(default)]
    pub period: GoalPeriod,
    /// Quantity to reach
    pub target_value: f64,
    /// Progress so far
    #[serde(default)]
    pub current_value: f64,
    /// First day of the window
    pub start_date: NaiveDate,
    /// Last day of the window
    pub end_date: NaiveDate,
    /// Owning sales territory
    #[serde(default)]
    pub territory_id: Option<TerritoryId>,
}

/// Partial update for a goal. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New metric
    pub metric: Option<GoalMetric>,
    /// New period
    pub period: Option<GoalPeriod>,
    /// New target
    pub target_value: Option<f64>,
    /// New current value
    pub current_value: Option<f64>,
    /// New start date
    pub start_date: Option<NaiveDate>,
    /// New end date
    pub end_date: Option<NaiveDate>,
    /// `Some(None)` detaches the goal from its territory
    pub territory_id: Option<Option<TerritoryId>>,
}

/// Filter for listing goals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalFilter {
    /// Only goals in this territory
    pub territory_id: Option<TerritoryId>,
    /// Only goals with this period
    pub period: Option<GoalPeriod>,
    /// Only goals whose window contains this date
    pub active_on: Option<NaiveDate>,
}

impl GoalFilter {
    /// Whether `goal` passes the filter.
    pub fn matches(&self, goal: &Goal) -> bool {
        if let Some(territory) = self.territory_id {
            if goal.territory_id != Some(territory) {
                return false;
            }
        }
        if let Some(period) = self.period {
            if goal.period != period {
                return false;
            }
        }
        if let Some(date) = self.active_on {
            if !goal.is_active_on(date) {
                return false;
            }
        }
        true
    }
}

/// Reporting period. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPeriod {
    /// One calendar month
    Monthly,
    /// One quarter
    #[default]
    Quarterly,
    /// One year
    Yearly,
    /// Any other window
    Custom,
}

impl GoalPeriod {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalPeriod::Monthly => "monthly",
            GoalPeriod::Quarterly => "quarterly",
            GoalPeriod::Yearly => "yearly",
            GoalPeriod::Custom => "custom",
        }
    }
}

impl std::str::FromStr for GoalPeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(GoalPeriod::Monthly),
            "quarterly" => Ok(GoalPeriod::Quarterly),
            "yearly" => Ok(GoalPeriod::Yearly),
            "custom" => Ok(GoalPeriod::Custom),
            other => Err(CoreError::validation("period", format!("unknown period '{}'", other))),
        }
    }
}

/// What a goal's values count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalMetric {
    /// Money booked
    #[default]
    Revenue,
    /// Units sold
    Units,
    /// Deals closed
    Deals,
    /// Named by the user
    Custom(String),
}

impl std::fmt::Display for GoalMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalMetric::Revenue => f.write_str("revenue"),
            GoalMetric::Units => f.write_str("units"),
            GoalMetric::Deals => f.write_str("deals"),
            GoalMetric::Custom(name) => f.write_str(name),
        }
    }
}

impl std::str::FromStr for GoalMetric {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "revenue" => GoalMetric::Revenue,
            "units" => GoalMetric::Units,
            "deals" => GoalMetric::Deals,
            _ => GoalMetric::Custom(s.to_string()),
        })
    }
}

/// How a goal is pacing against its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Target reached
    Completed,
    /// Keeping pace
    OnTrack,
    /// Slipping behind the expected pace
    AtRisk,
    /// Well behind the expected pace
    Behind,
}

impl GoalStatus {
    /// All statuses, worst first.
    pub const ALL: [GoalStatus; 4] = [
        GoalStatus::Behind,
        GoalStatus::AtRisk,
        GoalStatus::OnTrack,
        GoalStatus::Completed,
    ];

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Completed => "completed",
            GoalStatus::OnTrack => "on_track",
            GoalStatus::AtRisk => "at_risk",
            GoalStatus::Behind => "behind",
        }
    }

    /// Lower is worse. Used to order attention lists.
    pub fn urgency(&self) -> u8 {
        match self {
            GoalStatus::Behind => 0,
            GoalStatus::AtRisk => 1,
            GoalStatus::OnTrack => 2,
            GoalStatus::Completed => 3,
        }
    }

    /// Whether the goal should be surfaced for attention.
    pub fn needs_attention(&self) -> bool {
        matches!(self, GoalStatus::AtRisk | GoalStatus::Behind)
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a goal at a point in time. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    /// Percentage of target reached, not clamped
    pub percentage: f64,

    /// Share of the window elapsed, in percent
    pub expected_progress: f64,

    /// Pacing classification
    pub status: GoalStatus,

    /// Whole days since the start date, never negative
    pub time_elapsed: i64,

    /// Whole days until the end date, never negative
    pub time_remaining: i64,

    /// Whole days in the window, at least 1
    pub days_total: i64,

    /// Amount still needed to reach the target
    pub remaining: f64,

    /// Linear extrapolation of the final value
    pub projected_value: Option<f64>,
}

impl GoalProgress {
    /// Percentage clamped to `0..=100`, for progress bar widths.
    pub fn bar_width(&self) -> f64 {
        self.percentage.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_goal() -> NewGoal {
        NewGoal {
            title: "Q2 revenue".to_string(),
            description: String::new(),
            metric: GoalMetric::Revenue,
            period: GoalPeriod::Quarterly,
            target_value: 500_000.0,
            current_value: 0.0,
            start_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
            territory_id: None,
        }
    }

    #[test]
    fn test_valid_goal() {
        assert!(Goal::new(new_goal()).validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_window() {
        let mut new = new_goal();
        new.end_date = new.start_date;
        let err = Goal::new(new).validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "end_date", .. }));
    }

    #[test]
    fn test_rejects_zero_target() {
        let mut new = new_goal();
        new.target_value = 0.0;
        let err = Goal::new(new).validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "target_value", .. }));
    }

    #[test]
    fn test_rejects_blank_title_and_nan() {
        let mut new = new_goal();
        new.title = "   ".to_string();
        assert!(Goal::new(new).validate().is_err());

        let mut new = new_goal();
        new.current_value = f64::NAN;
        assert!(Goal::new(new).validate().is_err());
    }

    #[test]
    fn test_apply_update() {
        let mut goal = Goal::new(new_goal());
        let territory = TerritoryId::new();
        goal.territory_id = Some(territory);

        goal.apply(GoalUpdate {
            current_value: Some(1_000.0),
            territory_id: Some(None),
            ..Default::default()
        });

        assert_eq!(goal.current_value, 1_000.0);
        assert_eq!(goal.territory_id, None);
        assert_eq!(goal.title, "Q2 revenue");
    }

    #[test]
    fn test_is_active_on_is_inclusive() {
        let goal = Goal::new(new_goal());
        assert!(goal.is_active_on(goal.start_date));
        assert!(goal.is_active_on(goal.end_date));
        assert!(!goal.is_active_on(NaiveDate::from_ymd_opt(2023, 7, 1).unwrap()));
    }

    #[test]
    fn test_filter_matches() {
        let territory = TerritoryId::new();
        let mut goal = Goal::new(new_goal());
        goal.territory_id = Some(territory);

        assert!(GoalFilter::default().matches(&goal));
        assert!(GoalFilter { territory_id: Some(territory), ..Default::default() }.matches(&goal));
        assert!(!GoalFilter { territory_id: Some(TerritoryId::new()), ..Default::default() }.matches(&goal));
        assert!(!GoalFilter { period: Some(GoalPeriod::Yearly), ..Default::default() }.matches(&goal));
        assert!(GoalFilter {
            active_on: NaiveDate::from_ymd_opt(2023, 5, 1),
            ..Default::default()
        }
        .matches(&goal));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&GoalStatus::OnTrack).unwrap(), "\"on_track\"");
        assert_eq!(serde_json::to_string(&GoalStatus::AtRisk).unwrap(), "\"at_risk\"");
    }

    #[test]
    fn test_bar_width_clamps() {
        let progress = GoalProgress {
            percentage: 140.0,
            expected_progress: 50.0,
            status: GoalStatus::Completed,
            time_elapsed: 10,
            time_remaining: 10,
            days_total: 20,
            remaining: 0.0,
            projected_value: None,
        };
        assert_eq!(progress.bar_width(), 100.0);
        assert_eq!(progress.percentage, 140.0);
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("Units".parse::<GoalMetric>().unwrap(), GoalMetric::Units);
        assert_eq!(
            "calls".parse::<GoalMetric>().unwrap(),
            GoalMetric::Custom("calls".to_string())
        );
    }
}
