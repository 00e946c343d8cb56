//! Nutrition tracking.
//!
//! Two levels of logging share this module: the food diary (named
//! entries per meal) and nutrient-level records that daily summaries,
//! averages, and diet quality scores are computed from.

pub mod food;
pub mod quality;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use food::{FoodEntryStore, FoodError};
pub use quality::{score_day, QualityRating, QualityScore};
pub use store::{NutritionError, NutritionStore};
pub use types::{DailyNutrition, FoodEntry, Meal, NutritionAverages, NutritionEntry};
