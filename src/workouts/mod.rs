//! Workout logging.
//!
//! Logged sessions across activity types, plus the per-set detail
//! behind strength workouts. Deleting a workout removes its sets.

pub mod sets;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use sets::{WorkoutSetError, WorkoutSetStore};
pub use store::{WorkoutError, WorkoutStore};
pub use types::{Activity, ActivityTotals, Workout, WorkoutSet, WorkoutSummary};
