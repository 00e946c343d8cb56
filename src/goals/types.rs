//! Goal type definitions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A measurable goal set by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Database identifier, set once stored
    pub id: Option<i64>,
    /// User who owns this goal
    pub user_id: i64,
    /// Display title
    pub title: String,
    /// What is being measured
    pub kind: GoalKind,
    /// Value to reach
    pub target_value: f64,
    /// Value when the goal was set; only meaningful for weight goals
    pub start_value: f64,
    /// Latest recorded value
    pub current_value: f64,
    /// First day the goal counts
    pub start_date: NaiveDate,
    /// Day the goal must be reached by
    pub due_date: NaiveDate,
    /// Current status
    pub status: GoalStatus,
    /// When the goal was created
    pub created_at: DateTime<Utc>,
    /// When the goal was last updated
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Create a new active goal.
    pub fn new(
        user_id: i64,
        title: String,
        kind: GoalKind,
        target_value: f64,
        start_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            user_id,
            title,
            kind,
            target_value,
            start_value: 0.0,
            current_value: 0.0,
            start_date,
            due_date,
            status: GoalStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Days until the due date (negative once past it).
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }

    /// Whether the due date has passed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        today > self.due_date
    }
}

/// What a goal measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// Steps on a single day
    DailySteps,
    /// Workouts logged over the goal period
    WorkoutCount,
    /// Energy burned over the goal period
    CaloriesBurned,
    /// Distance covered over the goal period
    Distance,
    /// Body weight to reach
    Weight,
    /// Water drunk per day
    WaterIntake,
}

impl GoalKind {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::DailySteps => "daily_steps",
            GoalKind::WorkoutCount => "workout_count",
            GoalKind::CaloriesBurned => "calories_burned",
            GoalKind::Distance => "distance",
            GoalKind::Weight => "weight",
            GoalKind::WaterIntake => "water_intake",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily_steps" => Some(GoalKind::DailySteps),
            "workout_count" => Some(GoalKind::WorkoutCount),
            "calories_burned" => Some(GoalKind::CaloriesBurned),
            "distance" => Some(GoalKind::Distance),
            "weight" => Some(GoalKind::Weight),
            "water_intake" => Some(GoalKind::WaterIntake),
            _ => None,
        }
    }

    /// Whether progress accumulates toward the target, as opposed to
    /// weight goals which move toward it from either direction.
    pub fn is_cumulative(&self) -> bool {
        !matches!(self, GoalKind::Weight)
    }

    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            GoalKind::DailySteps => "Daily Steps",
            GoalKind::WorkoutCount => "Workout Count",
            GoalKind::CaloriesBurned => "Calories Burned",
            GoalKind::Distance => "Distance",
            GoalKind::Weight => "Weight",
            GoalKind::WaterIntake => "Water Intake",
        }
    }

    /// Get unit of measurement.
    pub fn unit(&self) -> &'static str {
        match self {
            GoalKind::DailySteps => "steps",
            GoalKind::WorkoutCount => "workouts",
            GoalKind::CaloriesBurned => "kcal",
            GoalKind::Distance => "km",
            GoalKind::Weight => "kg",
            GoalKind::WaterIntake => "ml",
        }
    }
}

impl std::fmt::Display for GoalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Status of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Goal is active and being tracked
    Active,
    /// Goal has been reached
    Completed,
    /// Due date passed without the goal being reached
    Expired,
    /// Goal was called off by the user
    Cancelled,
}

impl GoalStatus {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Expired => "expired",
            GoalStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(GoalStatus::Active),
            "completed" => Some(GoalStatus::Completed),
            "expired" => Some(GoalStatus::Expired),
            "cancelled" => Some(GoalStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the goal is still being actively tracked.
    pub fn is_active(&self) -> bool {
        matches!(self, GoalStatus::Active)
    }

    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            GoalStatus::Active => "Active",
            GoalStatus::Completed => "Completed",
            GoalStatus::Expired => "Expired",
            GoalStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
