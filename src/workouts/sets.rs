//! Workout set persistence and strength aggregation.

use rusqlite::{params, Connection, OptionalExtension};

use super::types::WorkoutSet;

/// Store for the sets inside strength workouts.
pub struct WorkoutSetStore<'a> {
    conn: &'a Connection,
}

impl<'a> WorkoutSetStore<'a> {
    /// Create a new set store with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record a set. Sets the id on success.
    pub fn insert(&self, set: &mut WorkoutSet) -> Result<(), WorkoutSetError> {
        validate(set)?;

        self.conn.execute(
            "INSERT INTO workout_sets
             (workout_id, exercise_id, set_number, reps, weight_kg, duration_secs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                set.workout_id,
                set.exercise_id,
                set.set_number,
                set.reps,
                set.weight_kg,
                set.duration_secs,
            ],
        )?;

        set.id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    /// Get a set by id.
    pub fn get(&self, id: i64) -> Result<Option<WorkoutSet>, WorkoutSetError> {
        self.conn
            .query_row(
                "SELECT id, workout_id, exercise_id, set_number, reps, weight_kg, duration_secs
                 FROM workout_sets WHERE id = ?1",
                params![id],
                parse_set_row,
            )
            .optional()
            .map_err(WorkoutSetError::from)
    }

    /// All sets of a workout in set-number order.
    pub fn sets_for_workout(&self, workout_id: i64) -> Result<Vec<WorkoutSet>, WorkoutSetError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, workout_id, exercise_id, set_number, reps, weight_kg, duration_secs
             FROM workout_sets
             WHERE workout_id = ?1
             ORDER BY set_number ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![workout_id], parse_set_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(WorkoutSetError::from)
    }

    /// Update an existing set.
    pub fn update(&self, set: &WorkoutSet) -> Result<(), WorkoutSetError> {
        let id = set
            .id
            .ok_or_else(|| WorkoutSetError::ValidationError("Set has no id".to_string()))?;

        validate(set)?;

        let updated = self.conn.execute(
            "UPDATE workout_sets SET
             exercise_id = ?1, set_number = ?2, reps = ?3, weight_kg = ?4, duration_secs = ?5
             WHERE id = ?6",
            params![
                set.exercise_id,
                set.set_number,
                set.reps,
                set.weight_kg,
                set.duration_secs,
                id,
            ],
        )?;

        if updated == 0 {
            return Err(WorkoutSetError::NotFound(id));
        }

        Ok(())
    }

    /// Delete a single set. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, WorkoutSetError> {
        let deleted = self
            .conn
            .execute("DELETE FROM workout_sets WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Delete every set of a workout. Returns how many were removed.
    pub fn delete_for_workout(&self, workout_id: i64) -> Result<usize, WorkoutSetError> {
        let deleted = self.conn.execute(
            "DELETE FROM workout_sets WHERE workout_id = ?1",
            params![workout_id],
        )?;
        Ok(deleted)
    }

    /// Total volume (reps x weight) lifted across a workout.
    ///
    /// Sets missing reps or weight contribute nothing.
    pub fn total_volume(&self, workout_id: i64) -> Result<f64, WorkoutSetError> {
        let volume: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM(reps * weight_kg), 0)
             FROM workout_sets
             WHERE workout_id = ?1 AND reps IS NOT NULL AND weight_kg IS NOT NULL",
            params![workout_id],
            |row| row.get(0),
        )?;

        Ok(volume)
    }

    /// Heaviest weight a user has logged for an exercise, across all
    /// their workouts.
    pub fn max_weight_for_exercise(
        &self,
        user_id: i64,
        exercise_id: i64,
    ) -> Result<Option<f64>, WorkoutSetError> {
        let max: Option<f64> = self.conn.query_row(
            "SELECT MAX(ws.weight_kg)
             FROM workout_sets ws
             JOIN workouts w ON w.id = ws.workout_id
             WHERE w.user_id = ?1 AND ws.exercise_id = ?2",
            params![user_id, exercise_id],
            |row| row.get(0),
        )?;

        Ok(max)
    }
}

/// Parse a database row into a WorkoutSet.
fn parse_set_row(row: &rusqlite::Row) -> rusqlite::Result<WorkoutSet> {
    Ok(WorkoutSet {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        exercise_id: row.get(2)?,
        set_number: row.get(3)?,
        reps: row.get(4)?,
        weight_kg: row.get(5)?,
        duration_secs: row.get(6)?,
    })
}

fn validate(set: &WorkoutSet) -> Result<(), WorkoutSetError> {
    if set.set_number == 0 {
        return Err(WorkoutSetError::ValidationError(
            "Set numbers start at 1".to_string(),
        ));
    }

    if set.reps.is_none() && set.duration_secs.is_none() {
        return Err(WorkoutSetError::ValidationError(
            "A set needs reps or a duration".to_string(),
        ));
    }

    if set.weight_kg.map_or(false, |w| w < 0.0) {
        return Err(WorkoutSetError::ValidationError(
            "Weight cannot be negative".to_string(),
        ));
    }

    Ok(())
}

/// Workout set errors.
#[derive(Debug, thiserror::Error)]
pub enum WorkoutSetError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Workout set not found: {0}")]
    NotFound(i64),
}
