//! Goal progress engine.
//!
//! Turns a goal snapshot and a clock reading into a [`GoalProgress`]. The
//! computation is pure and never fails: a zero-length window counts as one
//! day, a zero target yields 0%, and no projection is made before any time
//! has elapsed.

use chrono::{NaiveDate, NaiveTime, Utc};
use crate::goal::{Goal, GoalProgress};
use crate::policy::{PolicyKind, StatusInputs, StatusPolicy};
use crate::Time;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Time;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Time {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Time);

impl FixedClock {
    /// Pin the clock to midnight UTC of `date`.
    pub fn on(date: NaiveDate) -> Self {
        Self(date_start(date))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Time {
        self.0
    }
}

/// Midnight UTC at the start of `date`.
pub fn date_start(date: NaiveDate) -> Time {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Signed whole days from `from` to `to`, rounding partial days up.
pub fn days_between(from: Time, to: Time) -> i64 {
    let millis = (to - from).num_milliseconds();
    -(-millis).div_euclid(MILLIS_PER_DAY)
}

/// Compute progress with the canonical status policy.
pub fn compute_progress(goal: &Goal, now: Time) -> GoalProgress {
    compute_progress_with(goal, now, &PolicyKind::default())
}

/// Compute progress reading `now` from a clock.
pub fn compute_progress_now<P>(goal: &Goal, clock: &dyn Clock, policy: &P) -> GoalProgress
where
    P: StatusPolicy + ?Sized,
{
    compute_progress_with(goal, clock.now(), policy)
}

/// Compute progress with a caller-chosen status policy.
pub fn compute_progress_with<P>(goal: &Goal, now: Time, policy: &P) -> GoalProgress
where
    P: StatusPolicy + ?Sized,
{
    let start = date_start(goal.start_date);
    let end = date_start(goal.end_date);

    let days_total = match days_between(start, end) {
        d if d <= 0 => 1,
        d => d,
    };
    let time_elapsed = days_between(start, now).max(0);
    let time_remaining = days_between(now, end).max(0);

    let percentage = if goal.target_value == 0.0 {
        0.0
    } else {
        goal.current_value / goal.target_value * 100.0
    };
    let expected_progress = time_elapsed as f64 / days_total as f64 * 100.0;

    let status = policy.classify(&StatusInputs {
        percentage,
        expected_progress,
        time_remaining,
    });

    let projected_value = (time_elapsed > 0).then(|| {
        let daily_rate = goal.current_value / time_elapsed as f64;
        goal.current_value + daily_rate * time_remaining as f64
    });

    GoalProgress {
        percentage,
        expected_progress,
        status,
        time_elapsed,
        time_remaining,
        days_total,
        remaining: (goal.target_value - goal.current_value).max(0.0),
        projected_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::{GoalMetric, GoalPeriod, GoalStatus, NewGoal};
    use crate::policy::ScheduleVariancePolicy;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(target: f64, current: f64, start: NaiveDate, end: NaiveDate) -> Goal {
        Goal::new(NewGoal {
            title: "test".to_string(),
            description: String::new(),
            metric: GoalMetric::Revenue,
            period: GoalPeriod::Custom,
            target_value: target,
            current_value: current,
            start_date: start,
            end_date: end,
            territory_id: None,
        })
    }

    #[test]
    fn test_days_between_rounds_up() {
        let a = date_start(ymd(2023, 1, 1));
        assert_eq!(days_between(a, a), 0);
        assert_eq!(days_between(a, date_start(ymd(2023, 1, 2))), 1);
        assert_eq!(days_between(a, a + chrono::Duration::hours(1)), 1);
        assert_eq!(days_between(a + chrono::Duration::hours(1), a), 0);
        assert_eq!(days_between(date_start(ymd(2023, 1, 3)), a), -2);
    }

    #[test]
    fn test_scenario_on_track_quarter() {
        let g = goal(500_000.0, 325_000.0, ymd(2023, 4, 1), ymd(2023, 6, 30));
        let p = compute_progress(&g, date_start(ymd(2023, 5, 20)));

        assert_eq!(p.days_total, 90);
        assert_eq!(p.time_elapsed, 49);
        assert_eq!(p.time_remaining, 41);
        assert!((p.expected_progress - 54.444).abs() < 0.01);
        assert!((p.percentage - 65.0).abs() < 1e-9);
        assert_eq!(p.status, GoalStatus::OnTrack);
        assert_eq!(p.remaining, 175_000.0);

        let expected = 325_000.0 + 325_000.0 / 49.0 * 41.0;
        assert!((p.projected_value.unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_scenario_behind_year() {
        let g = goal(100.0, 10.0, ymd(2023, 1, 1), ymd(2023, 12, 31));
        let now = date_start(ymd(2023, 7, 1)) + chrono::Duration::hours(12);
        let p = compute_progress(&g, now);

        assert_eq!(p.days_total, 364);
        assert_eq!(p.time_elapsed, 182);
        assert!((p.expected_progress - 50.0).abs() < 0.01);
        assert_eq!(p.status, GoalStatus::Behind);
    }

    #[test]
    fn test_scenario_nothing_elapsed() {
        let g = goal(100.0, 0.0, ymd(2023, 3, 1), ymd(2023, 3, 31));
        let p = compute_progress(&g, date_start(g.start_date));

        assert_eq!(p.time_elapsed, 0);
        assert_eq!(p.projected_value, None);
        assert_eq!(p.percentage, 0.0);
        assert_eq!(p.expected_progress, 0.0);
        assert_eq!(p.status, GoalStatus::OnTrack);
    }

    #[test]
    fn test_reached_target_is_completed() {
        for current in [100.0, 100.5, 250.0] {
            let g = goal(100.0, current, ymd(2023, 1, 1), ymd(2023, 1, 31));
            let p = compute_progress(&g, date_start(ymd(2023, 1, 5)));
            assert_eq!(p.status, GoalStatus::Completed);
            assert!(p.percentage >= 100.0);
            assert_eq!(p.remaining, 0.0);
        }
    }

    #[test]
    fn test_zero_target_yields_zero_percent() {
        let g = goal(0.0, 50.0, ymd(2023, 1, 1), ymd(2023, 1, 31));
        let p = compute_progress(&g, date_start(ymd(2023, 1, 10)));
        assert_eq!(p.percentage, 0.0);
        assert_eq!(p.remaining, 0.0);
    }

    #[test]
    fn test_same_day_window() {
        let day = ymd(2023, 2, 14);
        let g = goal(10.0, 3.0, day, day);
        let p = compute_progress(&g, date_start(day));
        assert_eq!(p.days_total, 1);
        assert_eq!(p.time_elapsed, 0);
        assert_eq!(p.time_remaining, 0);
    }

    #[test]
    fn test_inverted_window_does_not_panic() {
        let g = goal(10.0, 3.0, ymd(2023, 2, 14), ymd(2023, 2, 1));
        let p = compute_progress(&g, date_start(ymd(2023, 2, 10)));
        assert_eq!(p.days_total, 1);
        assert_eq!(p.time_elapsed, 0);
        assert_eq!(p.time_remaining, 0);
    }

    #[test]
    fn test_elapsed_and_remaining_never_negative() {
        let g = goal(100.0, 40.0, ymd(2023, 6, 1), ymd(2023, 6, 30));

        let before = compute_progress(&g, date_start(ymd(2023, 1, 1)));
        assert_eq!(before.time_elapsed, 0);
        assert_eq!(before.time_remaining, 180);

        let after = compute_progress(&g, date_start(ymd(2024, 1, 1)));
        assert_eq!(after.time_remaining, 0);
        assert!(after.time_elapsed > after.days_total);
        // Past the end date there is nothing left to extrapolate
        assert_eq!(after.projected_value, Some(40.0));
    }

    #[test]
    fn test_pure_and_repeatable() {
        let g = goal(1_000.0, 333.0, ymd(2023, 1, 1), ymd(2023, 3, 31));
        let now = date_start(ymd(2023, 2, 7)) + chrono::Duration::minutes(90);
        assert_eq!(compute_progress(&g, now), compute_progress(&g, now));
    }

    #[test]
    fn test_policy_is_injectable() {
        // 18 points behind expected
        let g = goal(100.0, 32.0, ymd(2023, 1, 1), ymd(2023, 1, 11));
        let now = date_start(ymd(2023, 1, 6));

        let canonical = compute_progress(&g, now);
        assert_eq!(canonical.expected_progress, 50.0);
        assert_eq!(canonical.status, GoalStatus::AtRisk);

        let variance = compute_progress_with(&g, now, &ScheduleVariancePolicy::default());
        assert_eq!(variance.status, GoalStatus::Behind);
    }

    #[test]
    fn test_fixed_clock() {
        let g = goal(100.0, 50.0, ymd(2023, 1, 1), ymd(2023, 1, 11));
        let clock = FixedClock::on(ymd(2023, 1, 6));
        let p = compute_progress_now(&g, &clock, &PolicyKind::default());
        assert_eq!(p.time_elapsed, 5);
        assert_eq!(p.time_remaining, 5);
        assert_eq!(p.projected_value, Some(100.0));
    }
}
