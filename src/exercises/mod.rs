//! Exercise catalog.
//!
//! A shared catalog of named exercises that workout sets reference.
//! Names are unique and an exercise cannot be removed while sets
//! still point at it.

pub mod store;
pub mod types;

// Re-exports for convenience
pub use store::{ExerciseError, ExerciseStore};
pub use types::{Exercise, MuscleGroup};
