//! Workout persistence and aggregation.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::types::{Activity, ActivityTotals, Workout, WorkoutSummary};

/// Store for logged workouts.
pub struct WorkoutStore<'a> {
    conn: &'a Connection,
}

impl<'a> WorkoutStore<'a> {
    /// Create a new workout store with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Log a new workout. Sets the id on success.
    pub fn insert(&self, workout: &mut Workout) -> Result<(), WorkoutError> {
        validate(workout)?;

        self.conn.execute(
            "INSERT INTO workouts
             (user_id, title, activity, duration_min, calories, performed_on, notes,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                workout.user_id,
                workout.title,
                workout.activity.as_str(),
                workout.duration_min,
                workout.calories,
                workout.performed_on.to_string(),
                workout.notes,
                workout.created_at.to_rfc3339(),
                workout.updated_at.to_rfc3339(),
            ],
        )?;

        workout.id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    /// Get a workout by id.
    pub fn get(&self, id: i64) -> Result<Option<Workout>, WorkoutError> {
        self.conn
            .query_row(
                "SELECT id, user_id, title, activity, duration_min, calories, performed_on,
                        notes, created_at, updated_at
                 FROM workouts WHERE id = ?1",
                params![id],
                parse_workout_row,
            )
            .optional()
            .map_err(WorkoutError::from)
    }

    /// All workouts for a user, newest first.
    pub fn list_for_user(&self, user_id: i64) -> Result<Vec<Workout>, WorkoutError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, activity, duration_min, calories, performed_on,
                    notes, created_at, updated_at
             FROM workouts
             WHERE user_id = ?1
             ORDER BY performed_on DESC, id DESC",
        )?;

        let rows = stmt.query_map(params![user_id], parse_workout_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(WorkoutError::from)
    }

    /// Case-insensitive substring search over titles, newest first.
    pub fn search(&self, user_id: i64, query: &str) -> Result<Vec<Workout>, WorkoutError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, activity, duration_min, calories, performed_on,
                    notes, created_at, updated_at
             FROM workouts
             WHERE user_id = ?1 AND title LIKE ?2 ESCAPE '\\'
             ORDER BY performed_on DESC, id DESC",
        )?;

        let pattern = format!("%{}%", escape_like(query));
        let rows = stmt.query_map(params![user_id, pattern], parse_workout_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(WorkoutError::from)
    }

    /// Workouts performed between two days inclusive, oldest first.
    pub fn in_range(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Workout>, WorkoutError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, activity, duration_min, calories, performed_on,
                    notes, created_at, updated_at
             FROM workouts
             WHERE user_id = ?1 AND performed_on >= ?2 AND performed_on <= ?3
             ORDER BY performed_on ASC, id ASC",
        )?;

        let rows = stmt.query_map(
            params![user_id, from.to_string(), to.to_string()],
            parse_workout_row,
        )?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(WorkoutError::from)
    }

    /// Workouts of one activity for a user, newest first.
    pub fn by_activity(
        &self,
        user_id: i64,
        activity: Activity,
    ) -> Result<Vec<Workout>, WorkoutError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, activity, duration_min, calories, performed_on,
                    notes, created_at, updated_at
             FROM workouts
             WHERE user_id = ?1 AND activity = ?2
             ORDER BY performed_on DESC, id DESC",
        )?;

        let rows = stmt.query_map(params![user_id, activity.as_str()], parse_workout_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(WorkoutError::from)
    }

    /// Update an existing workout. Bumps `updated_at`.
    pub fn update(&self, workout: &Workout) -> Result<(), WorkoutError> {
        let id = workout
            .id
            .ok_or_else(|| WorkoutError::ValidationError("Workout has no id".to_string()))?;

        validate(workout)?;
        let now = Utc::now();

        let updated = self.conn.execute(
            "UPDATE workouts SET
             title = ?1, activity = ?2, duration_min = ?3, calories = ?4,
             performed_on = ?5, notes = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                workout.title,
                workout.activity.as_str(),
                workout.duration_min,
                workout.calories,
                workout.performed_on.to_string(),
                workout.notes,
                now.to_rfc3339(),
                id,
            ],
        )?;

        if updated == 0 {
            return Err(WorkoutError::NotFound(id));
        }

        Ok(())
    }

    /// Delete a workout and, through the schema, its sets.
    ///
    /// Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, WorkoutError> {
        let deleted = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Aggregate totals over the workouts in a date range.
    pub fn summary_between(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<WorkoutSummary, WorkoutError> {
        let (count, total_duration, total_calories): (u32, u64, f64) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(duration_min), 0),
                    COALESCE(SUM(calories), 0)
             FROM workouts
             WHERE user_id = ?1 AND performed_on >= ?2 AND performed_on <= ?3",
            params![user_id, from.to_string(), to.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let average_duration_min = if count == 0 {
            0.0
        } else {
            total_duration as f64 / count as f64
        };

        Ok(WorkoutSummary {
            count,
            total_duration_min: total_duration,
            total_calories,
            average_duration_min,
        })
    }

    /// Per-activity totals over a date range, busiest activity first.
    pub fn activity_breakdown(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ActivityTotals>, WorkoutError> {
        let mut stmt = self.conn.prepare(
            "SELECT activity, COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM workouts
             WHERE user_id = ?1 AND performed_on >= ?2 AND performed_on <= ?3
             GROUP BY activity
             ORDER BY SUM(duration_min) DESC, activity ASC",
        )?;

        let rows = stmt.query_map(
            params![user_id, from.to_string(), to.to_string()],
            |row| {
                let activity_str: String = row.get(0)?;
                let activity = Activity::parse(&activity_str).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        format!("Unknown activity: {}", activity_str).into(),
                    )
                })?;

                Ok(ActivityTotals {
                    activity,
                    count: row.get(1)?,
                    total_duration_min: row.get(2)?,
                })
            },
        )?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(WorkoutError::from)
    }
}

/// Parse a database row into a Workout.
fn parse_workout_row(row: &rusqlite::Row) -> rusqlite::Result<Workout> {
    let activity_str: String = row.get(3)?;
    let activity = Activity::parse(&activity_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("Unknown activity: {}", activity_str).into(),
        )
    })?;

    let performed_on_str: String = row.get(6)?;
    let performed_on = NaiveDate::parse_from_str(&performed_on_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at_str: String = row.get(8)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let updated_at_str: String = row.get(9)?;
    let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Workout {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        activity,
        duration_min: row.get(4)?,
        calories: row.get(5)?,
        performed_on,
        notes: row.get(7)?,
        created_at,
        updated_at,
    })
}

fn validate(workout: &Workout) -> Result<(), WorkoutError> {
    if workout.user_id <= 0 {
        return Err(WorkoutError::ValidationError(
            "User id must be positive".to_string(),
        ));
    }

    if workout.title.trim().is_empty() {
        return Err(WorkoutError::ValidationError(
            "Workout title cannot be empty".to_string(),
        ));
    }

    if workout.duration_min == 0 {
        return Err(WorkoutError::ValidationError(
            "Duration must be at least one minute".to_string(),
        ));
    }

    if workout.calories.map_or(false, |c| c < 0.0) {
        return Err(WorkoutError::ValidationError(
            "Calories cannot be negative".to_string(),
        ));
    }

    Ok(())
}

/// Escape LIKE wildcards in user-entered search text.
fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Workout errors.
#[derive(Debug, thiserror::Error)]
pub enum WorkoutError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Workout not found: {0}")]
    NotFound(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.connection()
            .execute(
                "INSERT INTO users (username, email, password_hash, created_at, updated_at)
                 VALUES ('lifter', 'lifter@example.com', 'x', datetime('now'), datetime('now'))",
                [],
            )
            .unwrap();
        db
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn sample(title: &str, activity: Activity, duration: u32, d: u32) -> Workout {
        Workout::new(1, title.to_string(), activity, duration, day(d))
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup();
        let store = WorkoutStore::new(db.connection());

        let mut workout = sample("Morning run", Activity::Running, 42, 3);
        workout.calories = Some(380.0);
        workout.notes = Some("Felt easy".to_string());
        store.insert(&mut workout).unwrap();

        let id = workout.id.unwrap();
        assert!(id > 0);

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.title, "Morning run");
        assert_eq!(stored.activity, Activity::Running);
        assert_eq!(stored.duration_min, 42);
        assert_eq!(stored.calories, Some(380.0));
        assert_eq!(stored.performed_on, day(3));
        assert_eq!(stored.notes, Some("Felt easy".to_string()));
    }

    #[test]
    fn test_list_is_newest_first() {
        let db = setup();
        let store = WorkoutStore::new(db.connection());

        store
            .insert(&mut sample("First", Activity::Walking, 30, 1))
            .unwrap();
        store
            .insert(&mut sample("Second", Activity::Walking, 30, 5))
            .unwrap();
        store
            .insert(&mut sample("Third", Activity::Walking, 30, 3))
            .unwrap();

        let workouts = store.list_for_user(1).unwrap();
        assert_eq!(workouts.len(), 3);
        assert_eq!(workouts[0].title, "Second");
        assert_eq!(workouts[1].title, "Third");
        assert_eq!(workouts[2].title, "First");
    }

    #[test]
    fn test_search_and_by_activity() {
        let db = setup();
        let store = WorkoutStore::new(db.connection());

        store
            .insert(&mut sample("Tempo run", Activity::Running, 40, 1))
            .unwrap();
        store
            .insert(&mut sample("Long run", Activity::Running, 90, 2))
            .unwrap();
        store
            .insert(&mut sample("Pool laps", Activity::Swimming, 45, 3))
            .unwrap();

        let runs = store.search(1, "run").unwrap();
        assert_eq!(runs.len(), 2);

        let swims = store.by_activity(1, Activity::Swimming).unwrap();
        assert_eq!(swims.len(), 1);
        assert_eq!(swims[0].title, "Pool laps");
    }

    #[test]
    fn test_in_range_is_inclusive() {
        let db = setup();
        let store = WorkoutStore::new(db.connection());

        for d in [1, 2, 3, 7] {
            store
                .insert(&mut sample("Session", Activity::Cycling, 60, d))
                .unwrap();
        }

        let workouts = store.in_range(1, day(2), day(7)).unwrap();
        assert_eq!(workouts.len(), 3);
        assert_eq!(workouts[0].performed_on, day(2));
        assert_eq!(workouts[2].performed_on, day(7));
    }

    #[test]
    fn test_update_bumps_timestamp() {
        let db = setup();
        let store = WorkoutStore::new(db.connection());

        let mut workout = sample("Draft", Activity::Yoga, 20, 1);
        store.insert(&mut workout).unwrap();
        let before = store.get(workout.id.unwrap()).unwrap().unwrap();

        workout.title = "Evening yoga".to_string();
        workout.duration_min = 35;
        store.update(&workout).unwrap();

        let after = store.get(workout.id.unwrap()).unwrap().unwrap();
        assert_eq!(after.title, "Evening yoga");
        assert_eq!(after.duration_min, 35);
        assert!(after.updated_at >= before.updated_at);
    }

    #[test]
    fn test_update_missing_workout() {
        let db = setup();
        let store = WorkoutStore::new(db.connection());

        let mut missing = sample("Ghost", Activity::Other, 10, 1);
        missing.id = Some(404);

        assert!(matches!(
            store.update(&missing),
            Err(WorkoutError::NotFound(404))
        ));
    }

    #[test]
    fn test_summary_and_breakdown() {
        let db = setup();
        let store = WorkoutStore::new(db.connection());

        let mut run = sample("Run", Activity::Running, 30, 1);
        run.calories = Some(300.0);
        store.insert(&mut run).unwrap();

        let mut ride = sample("Ride", Activity::Cycling, 90, 2);
        ride.calories = Some(700.0);
        store.insert(&mut ride).unwrap();

        store
            .insert(&mut sample("Jog", Activity::Running, 30, 3))
            .unwrap();

        let summary = store.summary_between(1, day(1), day(7)).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_duration_min, 150);
        assert!((summary.total_calories - 1000.0).abs() < f64::EPSILON);
        assert!((summary.average_duration_min - 50.0).abs() < f64::EPSILON);

        let breakdown = store.activity_breakdown(1, day(1), day(7)).unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].activity, Activity::Cycling);
        assert_eq!(breakdown[0].total_duration_min, 90);
        assert_eq!(breakdown[1].activity, Activity::Running);
        assert_eq!(breakdown[1].count, 2);
    }

    #[test]
    fn test_empty_summary_is_zeroed() {
        let db = setup();
        let store = WorkoutStore::new(db.connection());

        let summary = store.summary_between(1, day(1), day(7)).unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_duration_min, 0);
        assert_eq!(summary.average_duration_min, 0.0);
    }

    #[test]
    fn test_validation() {
        let db = setup();
        let store = WorkoutStore::new(db.connection());

        let mut untitled = sample("  ", Activity::Running, 30, 1);
        assert!(matches!(
            store.insert(&mut untitled),
            Err(WorkoutError::ValidationError(_))
        ));

        let mut zero_minutes = sample("Quick", Activity::Running, 0, 1);
        assert!(matches!(
            store.insert(&mut zero_minutes),
            Err(WorkoutError::ValidationError(_))
        ));
    }
}
