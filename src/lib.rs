//! FitLog - Fitness Tracking Data Layer
//!
//! The local-first data layer of a fitness tracking application built in Rust.
//! Provides SQLite-backed stores for steps, workouts, nutrition, goals, and
//! notifications, plus account management with on-device sessions.

pub mod auth;
pub mod exercises;
pub mod goals;
pub mod logging;
pub mod notifications;
pub mod nutrition;
pub mod stats;
pub mod steps;
pub mod storage;
pub mod workouts;

// Re-export commonly used types
pub use auth::AuthService;
pub use exercises::ExerciseStore;
pub use goals::GoalManager;
pub use notifications::NotificationStore;
pub use nutrition::{FoodEntryStore, NutritionStore};
pub use steps::StepStore;
pub use storage::Database;
pub use workouts::{WorkoutSetStore, WorkoutStore};
