//! Workout and workout set types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A logged workout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    /// Database identifier, set once stored
    pub id: Option<i64>,
    /// Owning user
    pub user_id: i64,
    /// Display title
    pub title: String,
    /// Activity category
    pub activity: Activity,
    /// Duration in minutes
    pub duration_min: u32,
    /// Estimated energy burned in kcal
    pub calories: Option<f64>,
    /// Day the workout took place
    pub performed_on: NaiveDate,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the workout was logged
    pub created_at: DateTime<Utc>,
    /// When the workout was last edited
    pub updated_at: DateTime<Utc>,
}

impl Workout {
    /// Create a new workout entry.
    pub fn new(
        user_id: i64,
        title: String,
        activity: Activity,
        duration_min: u32,
        performed_on: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            user_id,
            title,
            activity,
            duration_min,
            calories: None,
            performed_on,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Activity category for a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Running,
    Walking,
    Cycling,
    Swimming,
    Strength,
    Yoga,
    Hiit,
    Other,
}

impl Activity {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Running => "running",
            Activity::Walking => "walking",
            Activity::Cycling => "cycling",
            Activity::Swimming => "swimming",
            Activity::Strength => "strength",
            Activity::Yoga => "yoga",
            Activity::Hiit => "hiit",
            Activity::Other => "other",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Activity::Running),
            "walking" => Some(Activity::Walking),
            "cycling" => Some(Activity::Cycling),
            "swimming" => Some(Activity::Swimming),
            "strength" => Some(Activity::Strength),
            "yoga" => Some(Activity::Yoga),
            "hiit" => Some(Activity::Hiit),
            "other" => Some(Activity::Other),
            _ => None,
        }
    }

    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Activity::Running => "Running",
            Activity::Walking => "Walking",
            Activity::Cycling => "Cycling",
            Activity::Swimming => "Swimming",
            Activity::Strength => "Strength",
            Activity::Yoga => "Yoga",
            Activity::Hiit => "HIIT",
            Activity::Other => "Other",
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A single set within a strength workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSet {
    /// Database identifier, set once stored
    pub id: Option<i64>,
    /// Workout this set belongs to
    pub workout_id: i64,
    /// Catalog exercise performed
    pub exercise_id: i64,
    /// Position within the workout, starting at 1
    pub set_number: u32,
    /// Repetitions, for rep-based sets
    pub reps: Option<u32>,
    /// Weight lifted in kilograms
    pub weight_kg: Option<f64>,
    /// Duration in seconds, for timed sets
    pub duration_secs: Option<u32>,
}

impl WorkoutSet {
    /// Create a new set.
    pub fn new(workout_id: i64, exercise_id: i64, set_number: u32) -> Self {
        Self {
            id: None,
            workout_id,
            exercise_id,
            set_number,
            reps: None,
            weight_kg: None,
            duration_secs: None,
        }
    }

    /// Volume lifted in this set (reps x weight), when both are known.
    pub fn volume(&self) -> Option<f64> {
        match (self.reps, self.weight_kg) {
            (Some(reps), Some(weight)) => Some(reps as f64 * weight),
            _ => None,
        }
    }
}

/// Aggregates over the workouts in a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSummary {
    /// Number of workouts
    pub count: u32,
    /// Sum of durations in minutes
    pub total_duration_min: u64,
    /// Sum of logged calories
    pub total_calories: f64,
    /// Mean duration in minutes, 0 when empty
    pub average_duration_min: f64,
}

/// Per-activity totals within a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityTotals {
    /// Activity category
    pub activity: Activity,
    /// Number of workouts
    pub count: u32,
    /// Sum of durations in minutes
    pub total_duration_min: u64,
}
