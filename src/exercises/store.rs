//! Exercise catalog persistence.

use rusqlite::{params, Connection, OptionalExtension};

use super::types::{Exercise, MuscleGroup};

/// Store for the exercise catalog.
pub struct ExerciseStore<'a> {
    conn: &'a Connection,
}

impl<'a> ExerciseStore<'a> {
    /// Create a new exercise store with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Add an exercise to the catalog.
    ///
    /// Names are unique; inserting a taken name fails with
    /// [`ExerciseError::DuplicateName`]. Sets the id on success.
    pub fn insert(&self, exercise: &mut Exercise) -> Result<(), ExerciseError> {
        validate(exercise)?;

        let result = self.conn.execute(
            "INSERT INTO exercises (name, muscle_group, equipment, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                exercise.name,
                exercise.muscle_group.as_str(),
                exercise.equipment,
                exercise.description,
                exercise.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                exercise.id = Some(self.conn.last_insert_rowid());
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => {
                Err(ExerciseError::DuplicateName(exercise.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get an exercise by id.
    pub fn get(&self, id: i64) -> Result<Option<Exercise>, ExerciseError> {
        self.conn
            .query_row(
                "SELECT id, name, muscle_group, equipment, description, created_at
                 FROM exercises WHERE id = ?1",
                params![id],
                parse_exercise_row,
            )
            .optional()
            .map_err(ExerciseError::from)
    }

    /// All exercises, sorted by name.
    pub fn all(&self) -> Result<Vec<Exercise>, ExerciseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, muscle_group, equipment, description, created_at
             FROM exercises ORDER BY name COLLATE NOCASE ASC",
        )?;

        let rows = stmt.query_map([], parse_exercise_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(ExerciseError::from)
    }

    /// Case-insensitive substring search over names.
    pub fn search(&self, query: &str) -> Result<Vec<Exercise>, ExerciseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, muscle_group, equipment, description, created_at
             FROM exercises
             WHERE name LIKE ?1 ESCAPE '\\'
             ORDER BY name COLLATE NOCASE ASC",
        )?;

        let pattern = format!("%{}%", escape_like(query));
        let rows = stmt.query_map(params![pattern], parse_exercise_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(ExerciseError::from)
    }

    /// Exercises targeting a muscle group, sorted by name.
    pub fn by_muscle_group(&self, group: MuscleGroup) -> Result<Vec<Exercise>, ExerciseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, muscle_group, equipment, description, created_at
             FROM exercises
             WHERE muscle_group = ?1
             ORDER BY name COLLATE NOCASE ASC",
        )?;

        let rows = stmt.query_map(params![group.as_str()], parse_exercise_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(ExerciseError::from)
    }

    /// Update an existing exercise.
    pub fn update(&self, exercise: &Exercise) -> Result<(), ExerciseError> {
        let id = exercise
            .id
            .ok_or_else(|| ExerciseError::ValidationError("Exercise has no id".to_string()))?;

        validate(exercise)?;

        let result = self.conn.execute(
            "UPDATE exercises SET
             name = ?1, muscle_group = ?2, equipment = ?3, description = ?4
             WHERE id = ?5",
            params![
                exercise.name,
                exercise.muscle_group.as_str(),
                exercise.equipment,
                exercise.description,
                id,
            ],
        );

        match result {
            Ok(0) => Err(ExerciseError::NotFound(id)),
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => {
                Err(ExerciseError::DuplicateName(exercise.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an exercise.
    ///
    /// Fails with [`ExerciseError::InUse`] while any workout set still
    /// references it. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, ExerciseError> {
        let result = self
            .conn
            .execute("DELETE FROM exercises WHERE id = ?1", params![id]);

        match result {
            Ok(deleted) => Ok(deleted > 0),
            Err(e) if is_constraint_violation(&e) => Err(ExerciseError::InUse(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of exercises in the catalog.
    pub fn count(&self) -> Result<u32, ExerciseError> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM exercises", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Parse a database row into an Exercise.
fn parse_exercise_row(row: &rusqlite::Row) -> rusqlite::Result<Exercise> {
    let group_str: String = row.get(2)?;
    let muscle_group = MuscleGroup::parse(&group_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("Unknown muscle group: {}", group_str).into(),
        )
    })?;

    let created_at_str: String = row.get(5)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map(|t| t.with_timezone(&chrono::Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Exercise {
        id: row.get(0)?,
        name: row.get(1)?,
        muscle_group,
        equipment: row.get(3)?,
        description: row.get(4)?,
        created_at,
    })
}

fn validate(exercise: &Exercise) -> Result<(), ExerciseError> {
    if exercise.name.trim().is_empty() {
        return Err(ExerciseError::ValidationError(
            "Exercise name cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Escape LIKE wildcards in user-entered search text.
fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Exercise catalog errors.
#[derive(Debug, thiserror::Error)]
pub enum ExerciseError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Exercise name already exists: {0}")]
    DuplicateName(String),

    #[error("Exercise is referenced by workout sets: {0}")]
    InUse(i64),

    #[error("Exercise not found: {0}")]
    NotFound(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn sample(name: &str, group: MuscleGroup) -> Exercise {
        Exercise::new(name.to_string(), group)
    }

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let store = ExerciseStore::new(db.connection());

        let mut exercise = sample("Bench Press", MuscleGroup::Chest);
        exercise.equipment = Some("Barbell".to_string());
        store.insert(&mut exercise).unwrap();

        let id = exercise.id.unwrap();
        assert!(id > 0);

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.name, "Bench Press");
        assert_eq!(stored.muscle_group, MuscleGroup::Chest);
        assert_eq!(stored.equipment, Some("Barbell".to_string()));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = Database::open_in_memory().unwrap();
        let store = ExerciseStore::new(db.connection());

        store
            .insert(&mut sample("Squat", MuscleGroup::Legs))
            .unwrap();

        let result = store.insert(&mut sample("Squat", MuscleGroup::Legs));
        assert!(matches!(result, Err(ExerciseError::DuplicateName(_))));
    }

    #[test]
    fn test_search_and_filter() {
        let db = Database::open_in_memory().unwrap();
        let store = ExerciseStore::new(db.connection());

        store
            .insert(&mut sample("Incline Press", MuscleGroup::Chest))
            .unwrap();
        store
            .insert(&mut sample("Leg Press", MuscleGroup::Legs))
            .unwrap();
        store
            .insert(&mut sample("Deadlift", MuscleGroup::Back))
            .unwrap();

        let presses = store.search("Press").unwrap();
        assert_eq!(presses.len(), 2);
        assert_eq!(presses[0].name, "Incline Press");
        assert_eq!(presses[1].name, "Leg Press");

        let legs = store.by_muscle_group(MuscleGroup::Legs).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].name, "Leg Press");

        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let db = Database::open_in_memory().unwrap();
        let store = ExerciseStore::new(db.connection());

        store
            .insert(&mut sample("100% Row", MuscleGroup::Back))
            .unwrap();
        store
            .insert(&mut sample("Cable Row", MuscleGroup::Back))
            .unwrap();

        // A literal percent must not match everything
        let hits = store.search("100%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "100% Row");
    }

    #[test]
    fn test_update() {
        let db = Database::open_in_memory().unwrap();
        let store = ExerciseStore::new(db.connection());

        let mut exercise = sample("Curl", MuscleGroup::Arms);
        store.insert(&mut exercise).unwrap();

        exercise.name = "Hammer Curl".to_string();
        exercise.equipment = Some("Dumbbells".to_string());
        store.update(&exercise).unwrap();

        let stored = store.get(exercise.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.name, "Hammer Curl");
        assert_eq!(stored.equipment, Some("Dumbbells".to_string()));
    }

    #[test]
    fn test_update_missing_exercise() {
        let db = Database::open_in_memory().unwrap();
        let store = ExerciseStore::new(db.connection());

        let mut exercise = sample("Ghost", MuscleGroup::Core);
        exercise.id = Some(99);

        assert!(matches!(
            store.update(&exercise),
            Err(ExerciseError::NotFound(99))
        ));
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let store = ExerciseStore::new(db.connection());

        let mut exercise = sample("Plank", MuscleGroup::Core);
        store.insert(&mut exercise).unwrap();
        let id = exercise.id.unwrap();

        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert!(store.get(id).unwrap().is_none());
    }
}
