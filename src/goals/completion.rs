//! Goal completion arithmetic.
//!
//! Whether a goal counts as reached depends on its kind. Counted
//! goals (steps, workouts) are exact. Measured quantities carry a
//! tolerance band below the target so a near miss still completes.
//! Weight goals are approached from either direction and complete
//! inside a band around the target; moving past the target beyond
//! the band is overachievement.

use chrono::NaiveDate;

use super::types::{Goal, GoalKind};

/// Ratio of current to target at which a cumulative goal counts as
/// overachieved.
pub const OVERACHIEVEMENT_RATIO: f64 = 1.10;

/// Tolerance band for a goal kind, as a fraction of the target.
pub fn tolerance_for(kind: GoalKind) -> f64 {
    match kind {
        // Counted goals complete exactly
        GoalKind::DailySteps | GoalKind::WorkoutCount => 0.0,
        // Measured quantities carry sensor and estimation error
        GoalKind::CaloriesBurned | GoalKind::Distance | GoalKind::WaterIntake => 0.02,
        GoalKind::Weight => 0.01,
    }
}

/// Result of evaluating a goal against its current value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalEvaluation {
    /// Progress toward the target, 0-100
    pub progress_percent: f64,
    /// Raw current/target ratio for cumulative goals
    pub ratio: Option<f64>,
    /// Whether the goal counts as reached
    pub completed: bool,
    /// Whether the goal was exceeded past the overachievement mark
    pub overachieved: bool,
    /// Whether the due date passed without completion
    pub expired: bool,
}

/// Evaluate a goal as of `today`.
pub fn evaluate(goal: &Goal, today: NaiveDate) -> GoalEvaluation {
    let (progress_percent, ratio, completed, overachieved) = if goal.kind.is_cumulative() {
        evaluate_cumulative(goal)
    } else {
        evaluate_weight(goal)
    };

    let expired = !completed && goal.is_overdue(today);

    GoalEvaluation {
        progress_percent,
        ratio,
        completed,
        overachieved,
        expired,
    }
}

fn evaluate_cumulative(goal: &Goal) -> (f64, Option<f64>, bool, bool) {
    if goal.target_value <= 0.0 {
        return (0.0, None, false, false);
    }

    let ratio = goal.current_value / goal.target_value;
    let tolerance = tolerance_for(goal.kind);

    let completed = ratio >= 1.0 - tolerance;
    let overachieved = ratio >= OVERACHIEVEMENT_RATIO;
    let progress = (ratio * 100.0).clamp(0.0, 100.0);

    (progress, Some(ratio), completed, overachieved)
}

fn evaluate_weight(goal: &Goal) -> (f64, Option<f64>, bool, bool) {
    let target = goal.target_value;
    if target <= 0.0 {
        return (0.0, None, false, false);
    }

    let band = tolerance_for(GoalKind::Weight) * target;
    let within_band = (goal.current_value - target).abs() <= band;

    // Which side of the target the goal started on decides what
    // counts as having moved past it
    let losing = goal.start_value > target;
    let gaining = goal.start_value < target;
    let passed_beyond_band = (losing && goal.current_value < target - band)
        || (gaining && goal.current_value > target + band);

    let completed = within_band || passed_beyond_band;
    let overachieved = passed_beyond_band;

    let progress = if completed {
        100.0
    } else {
        let total = (goal.start_value - target).abs();
        let toward = (losing && goal.current_value < goal.start_value)
            || (gaining && goal.current_value > goal.start_value);

        if total <= f64::EPSILON || !toward {
            0.0
        } else {
            let moved = (goal.start_value - goal.current_value).abs();
            (moved / total * 100.0).clamp(0.0, 100.0)
        }
    };

    (progress, None, completed, overachieved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn goal(kind: GoalKind, target: f64) -> Goal {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let due = NaiveDate::from_ymd_opt(2024, 7, 31).unwrap();
        Goal::new(1, "Test".to_string(), kind, target, start, due)
    }

    fn mid_july() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    #[test]
    fn test_counted_goals_have_no_band() {
        let mut g = goal(GoalKind::DailySteps, 10000.0);

        g.current_value = 9999.0;
        let eval = evaluate(&g, mid_july());
        assert!(!eval.completed);
        assert!((eval.progress_percent - 99.99).abs() < 1e-9);

        g.current_value = 10000.0;
        assert!(evaluate(&g, mid_july()).completed);
    }

    #[test]
    fn test_measured_goals_complete_within_band() {
        let mut g = goal(GoalKind::Distance, 100.0);

        // 2% under still counts
        g.current_value = 98.5;
        let eval = evaluate(&g, mid_july());
        assert!(eval.completed);
        assert!(!eval.overachieved);

        g.current_value = 97.5;
        assert!(!evaluate(&g, mid_july()).completed);
    }

    #[test]
    fn test_overachievement_at_110_percent() {
        let mut g = goal(GoalKind::CaloriesBurned, 5000.0);

        g.current_value = 5400.0;
        let eval = evaluate(&g, mid_july());
        assert!(eval.completed);
        assert!(!eval.overachieved);

        g.current_value = 5500.0;
        let eval = evaluate(&g, mid_july());
        assert!(eval.overachieved);
        assert_eq!(eval.ratio, Some(1.1));
        // Display progress stays capped
        assert_eq!(eval.progress_percent, 100.0);
    }

    #[test]
    fn test_weight_loss_goal() {
        let mut g = goal(GoalKind::Weight, 80.0);
        g.start_value = 90.0;

        // Halfway down
        g.current_value = 85.0;
        let eval = evaluate(&g, mid_july());
        assert!(!eval.completed);
        assert!((eval.progress_percent - 50.0).abs() < 1e-9);

        // Inside the 1% band on either side of the target
        g.current_value = 80.5;
        assert!(evaluate(&g, mid_july()).completed);
        g.current_value = 79.5;
        let eval = evaluate(&g, mid_july());
        assert!(eval.completed);
        assert!(!eval.overachieved);

        // Past the target beyond the band
        g.current_value = 79.0;
        let eval = evaluate(&g, mid_july());
        assert!(eval.completed);
        assert!(eval.overachieved);

        // Gained instead of lost
        g.current_value = 92.0;
        let eval = evaluate(&g, mid_july());
        assert!(!eval.completed);
        assert_eq!(eval.progress_percent, 0.0);
    }

    #[test]
    fn test_weight_gain_goal() {
        let mut g = goal(GoalKind::Weight, 65.0);
        g.start_value = 60.0;

        g.current_value = 62.5;
        let eval = evaluate(&g, mid_july());
        assert!((eval.progress_percent - 50.0).abs() < 1e-9);

        g.current_value = 64.5;
        assert!(evaluate(&g, mid_july()).completed);

        g.current_value = 66.0;
        let eval = evaluate(&g, mid_july());
        assert!(eval.completed);
        assert!(eval.overachieved);
    }

    #[test]
    fn test_expiry_requires_missing_the_target() {
        let mut g = goal(GoalKind::WorkoutCount, 12.0);
        let past_due = NaiveDate::from_ymd_opt(2024, 8, 5).unwrap();

        g.current_value = 7.0;
        let eval = evaluate(&g, past_due);
        assert!(eval.expired);
        assert!(!eval.completed);

        // Reaching the target, even late, is not an expiry
        g.current_value = 12.0;
        let eval = evaluate(&g, past_due);
        assert!(eval.completed);
        assert!(!eval.expired);
    }

    #[test]
    fn test_zero_target_never_completes() {
        let mut g = goal(GoalKind::Distance, 0.0);
        g.current_value = 5.0;

        let eval = evaluate(&g, mid_july());
        assert!(!eval.completed);
        assert_eq!(eval.ratio, None);
        assert_eq!(eval.progress_percent, 0.0);
    }
}
