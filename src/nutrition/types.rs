//! Nutrition tracking types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A food diary entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodEntry {
    /// Database identifier, set once stored
    pub id: Option<i64>,
    /// Owning user
    pub user_id: i64,
    /// What was eaten
    pub name: String,
    /// Meal the food belongs to
    pub meal: Meal,
    /// Energy in kcal
    pub calories: f64,
    /// Day the food was eaten
    pub eaten_on: NaiveDate,
    /// When the entry was logged
    pub created_at: DateTime<Utc>,
}

impl FoodEntry {
    /// Create a new diary entry.
    pub fn new(user_id: i64, name: String, meal: Meal, calories: f64, eaten_on: NaiveDate) -> Self {
        Self {
            id: None,
            user_id,
            name,
            meal,
            calories,
            eaten_on,
            created_at: Utc::now(),
        }
    }
}

/// Meal slot within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl Meal {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
            Meal::Snack => "snack",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "breakfast" => Some(Meal::Breakfast),
            "lunch" => Some(Meal::Lunch),
            "dinner" => Some(Meal::Dinner),
            "snack" => Some(Meal::Snack),
            _ => None,
        }
    }

    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Meal::Breakfast => "Breakfast",
            Meal::Lunch => "Lunch",
            Meal::Dinner => "Dinner",
            Meal::Snack => "Snack",
        }
    }
}

impl std::fmt::Display for Meal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A nutrient-level record for part of a day.
///
/// Several records may exist for the same day; day queries sum them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionEntry {
    /// Database identifier, set once stored
    pub id: Option<i64>,
    /// Owning user
    pub user_id: i64,
    /// Day the record belongs to
    pub day: NaiveDate,
    /// Energy in kcal
    pub calories: f64,
    /// Protein in grams
    pub protein_g: f64,
    /// Carbohydrates in grams
    pub carbs_g: f64,
    /// Fat in grams
    pub fat_g: f64,
    /// Fiber in grams
    pub fiber_g: f64,
    /// Sugar in grams
    pub sugar_g: f64,
    /// Sodium in milligrams
    pub sodium_mg: f64,
    /// Water in milliliters
    pub water_ml: f64,
    /// When the record was logged
    pub created_at: DateTime<Utc>,
}

impl NutritionEntry {
    /// Create a new record with all nutrients zeroed.
    pub fn new(user_id: i64, day: NaiveDate) -> Self {
        Self {
            id: None,
            user_id,
            day,
            calories: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
            fiber_g: 0.0,
            sugar_g: 0.0,
            sodium_mg: 0.0,
            water_ml: 0.0,
            created_at: Utc::now(),
        }
    }
}

/// Summed nutrients for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyNutrition {
    /// Day the totals cover
    pub day: NaiveDate,
    /// Energy in kcal
    pub calories: f64,
    /// Protein in grams
    pub protein_g: f64,
    /// Carbohydrates in grams
    pub carbs_g: f64,
    /// Fat in grams
    pub fat_g: f64,
    /// Fiber in grams
    pub fiber_g: f64,
    /// Sugar in grams
    pub sugar_g: f64,
    /// Sodium in milligrams
    pub sodium_mg: f64,
    /// Water in milliliters
    pub water_ml: f64,
}

/// Mean daily nutrient totals across the recorded days of a range.
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionAverages {
    /// Days in the range that have at least one record
    pub recorded_days: u32,
    /// Mean daily energy in kcal
    pub calories: f64,
    /// Mean daily protein in grams
    pub protein_g: f64,
    /// Mean daily carbohydrates in grams
    pub carbs_g: f64,
    /// Mean daily fat in grams
    pub fat_g: f64,
    /// Mean daily water in milliliters
    pub water_ml: f64,
}
