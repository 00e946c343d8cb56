//! Fitness goals module.
//!
//! Manages user fitness objectives including:
//! - Cumulative targets (steps, workouts, calories, distance, water)
//! - Weight targets tracked from a starting weight
//! - Completion evaluation with per-kind tolerance bands

pub mod completion;
pub mod manager;
pub mod types;

// Re-exports for convenience
pub use completion::{evaluate, tolerance_for, GoalEvaluation, OVERACHIEVEMENT_RATIO};
pub use manager::{GoalError, GoalManager};
pub use types::{Goal, GoalKind, GoalStatus};
