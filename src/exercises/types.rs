//! Exercise catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog exercise that workout sets reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// Database identifier, set once stored
    pub id: Option<i64>,
    /// Unique display name
    pub name: String,
    /// Primary muscle group
    pub muscle_group: MuscleGroup,
    /// Equipment needed, if any
    pub equipment: Option<String>,
    /// Optional how-to text
    pub description: Option<String>,
    /// When the exercise was added to the catalog
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    /// Create a new catalog entry.
    pub fn new(name: String, muscle_group: MuscleGroup) -> Self {
        Self {
            id: None,
            name,
            muscle_group,
            equipment: None,
            description: None,
            created_at: Utc::now(),
        }
    }
}

/// Primary muscle group targeted by an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Arms,
    Legs,
    Core,
    FullBody,
}

impl MuscleGroup {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Arms => "arms",
            MuscleGroup::Legs => "legs",
            MuscleGroup::Core => "core",
            MuscleGroup::FullBody => "fullbody",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chest" => Some(MuscleGroup::Chest),
            "back" => Some(MuscleGroup::Back),
            "shoulders" => Some(MuscleGroup::Shoulders),
            "arms" => Some(MuscleGroup::Arms),
            "legs" => Some(MuscleGroup::Legs),
            "core" => Some(MuscleGroup::Core),
            "fullbody" => Some(MuscleGroup::FullBody),
            _ => None,
        }
    }

    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Arms => "Arms",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Core => "Core",
            MuscleGroup::FullBody => "Full Body",
        }
    }
}

impl std::fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muscle_group_round_trip() {
        for group in [
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Shoulders,
            MuscleGroup::Arms,
            MuscleGroup::Legs,
            MuscleGroup::Core,
            MuscleGroup::FullBody,
        ] {
            assert_eq!(MuscleGroup::parse(group.as_str()), Some(group));
        }

        assert_eq!(MuscleGroup::parse("cardio"), None);
    }
}
