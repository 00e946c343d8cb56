//! Diet quality scoring.
//!
//! Scores a day of eating 0-100 from six weighted components. Macro
//! components compare each macro's share of energy against an
//! accepted range; fiber is scored against intake per 1000 kcal;
//! sugar and sodium are penalty components that only drop below 100
//! past their limits.

use serde::{Deserialize, Serialize};

use super::types::DailyNutrition;

/// kcal per gram of protein and carbohydrate.
const KCAL_PER_G_PROTEIN_CARB: f64 = 4.0;
/// kcal per gram of fat.
const KCAL_PER_G_FAT: f64 = 9.0;

/// Accepted share of energy from protein.
const PROTEIN_BAND: (f64, f64) = (0.10, 0.35);
/// Accepted share of energy from carbohydrates.
const CARBS_BAND: (f64, f64) = (0.45, 0.65);
/// Accepted share of energy from fat.
const FAT_BAND: (f64, f64) = (0.20, 0.35);

/// Fiber target in grams per 1000 kcal.
const FIBER_G_PER_1000_KCAL: f64 = 14.0;
/// Share of energy from sugar above which the sugar score drops.
const SUGAR_FREE_SHARE: f64 = 0.10;
/// Share of energy from sugar at which the sugar score reaches zero.
const SUGAR_ZERO_SHARE: f64 = 0.25;
/// Sodium in mg below which the sodium score stays at 100.
const SODIUM_LIMIT_MG: f64 = 2300.0;

const WEIGHT_PROTEIN: f64 = 0.20;
const WEIGHT_CARBS: f64 = 0.15;
const WEIGHT_FAT: f64 = 0.15;
const WEIGHT_FIBER: f64 = 0.20;
const WEIGHT_SUGAR: f64 = 0.15;
const WEIGHT_SODIUM: f64 = 0.15;

/// Quality rating bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityRating {
    /// Score below 40.
    Poor,
    /// Score 40 to below 60.
    Fair,
    /// Score 60 to below 80.
    Good,
    /// Score 80 and up.
    Excellent,
}

impl QualityRating {
    /// Classify a 0-100 score.
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            QualityRating::Poor
        } else if score < 60.0 {
            QualityRating::Fair
        } else if score < 80.0 {
            QualityRating::Good
        } else {
            QualityRating::Excellent
        }
    }

    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            QualityRating::Poor => "Poor",
            QualityRating::Fair => "Fair",
            QualityRating::Good => "Good",
            QualityRating::Excellent => "Excellent",
        }
    }
}

impl std::fmt::Display for QualityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A scored day, with the per-component values the score came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityScore {
    /// Weighted total, 0-100
    pub total: f64,
    /// Rating band for the total
    pub rating: QualityRating,
    /// Protein share component, 0-100
    pub protein: f64,
    /// Carbohydrate share component, 0-100
    pub carbs: f64,
    /// Fat share component, 0-100
    pub fat: f64,
    /// Fiber density component, 0-100
    pub fiber: f64,
    /// Sugar penalty component, 0-100
    pub sugar: f64,
    /// Sodium penalty component, 0-100
    pub sodium: f64,
}

/// Score a day of eating.
///
/// A day with no logged energy scores zero; shares of energy are
/// meaningless without a denominator.
pub fn score_day(day: &DailyNutrition) -> QualityScore {
    if day.calories <= 0.0 {
        return QualityScore {
            total: 0.0,
            rating: QualityRating::Poor,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            fiber: 0.0,
            sugar: 0.0,
            sodium: 0.0,
        };
    }

    let protein_share = day.protein_g * KCAL_PER_G_PROTEIN_CARB / day.calories;
    let carbs_share = day.carbs_g * KCAL_PER_G_PROTEIN_CARB / day.calories;
    let fat_share = day.fat_g * KCAL_PER_G_FAT / day.calories;
    let sugar_share = day.sugar_g * KCAL_PER_G_PROTEIN_CARB / day.calories;

    let protein = band_score(protein_share, PROTEIN_BAND);
    let carbs = band_score(carbs_share, CARBS_BAND);
    let fat = band_score(fat_share, FAT_BAND);
    let fiber = fiber_score(day.fiber_g, day.calories);
    let sugar = sugar_score(sugar_share);
    let sodium = sodium_score(day.sodium_mg);

    let total = WEIGHT_PROTEIN * protein
        + WEIGHT_CARBS * carbs
        + WEIGHT_FAT * fat
        + WEIGHT_FIBER * fiber
        + WEIGHT_SUGAR * sugar
        + WEIGHT_SODIUM * sodium;
    let total = total.clamp(0.0, 100.0);

    QualityScore {
        total,
        rating: QualityRating::from_score(total),
        protein,
        carbs,
        fat,
        fiber,
        sugar,
        sodium,
    }
}

/// Score a macro's share of energy against its accepted band.
///
/// 100 inside the band. Below it the score falls linearly to 0 at a
/// zero share; above it the score falls linearly to 0 at double the
/// upper edge.
fn band_score(share: f64, (lo, hi): (f64, f64)) -> f64 {
    if share < lo {
        100.0 * (share / lo).max(0.0)
    } else if share > hi {
        100.0 * (1.0 - (share - hi) / hi).max(0.0)
    } else {
        100.0
    }
}

/// Score fiber against the density target, capped at 100.
fn fiber_score(fiber_g: f64, calories: f64) -> f64 {
    let target = FIBER_G_PER_1000_KCAL * calories / 1000.0;
    100.0 * (fiber_g / target).clamp(0.0, 1.0)
}

/// Sugar keeps 100 up to the free share, then falls linearly to 0.
fn sugar_score(share: f64) -> f64 {
    if share <= SUGAR_FREE_SHARE {
        return 100.0;
    }

    let over = (share - SUGAR_FREE_SHARE) / (SUGAR_ZERO_SHARE - SUGAR_FREE_SHARE);
    100.0 * (1.0 - over).max(0.0)
}

/// Sodium keeps 100 up to the limit, then falls linearly to 0 at
/// double the limit.
fn sodium_score(sodium_mg: f64) -> f64 {
    if sodium_mg <= SODIUM_LIMIT_MG {
        return 100.0;
    }

    100.0 * (1.0 - (sodium_mg - SODIUM_LIMIT_MG) / SODIUM_LIMIT_MG).max(0.0)
}
