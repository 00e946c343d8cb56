//! Step record persistence and aggregation.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::types::StepRecord;
use crate::stats;

/// Store for daily step records.
pub struct StepStore<'a> {
    conn: &'a Connection,
}

impl<'a> StepStore<'a> {
    /// Create a new step store with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert or replace the record for the user and day.
    ///
    /// Sets the record's id on success.
    pub fn upsert(&self, record: &mut StepRecord) -> Result<(), StepError> {
        validate(record)?;

        self.conn.execute(
            "INSERT INTO steps (user_id, day, count, distance_m, calories)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, day) DO UPDATE SET
                 count = excluded.count,
                 distance_m = excluded.distance_m,
                 calories = excluded.calories",
            params![
                record.user_id,
                record.day.to_string(),
                record.count,
                record.distance_m,
                record.calories,
            ],
        )?;

        // last_insert_rowid is not meaningful on the update path, so
        // read the id back instead
        let id: i64 = self.conn.query_row(
            "SELECT id FROM steps WHERE user_id = ?1 AND day = ?2",
            params![record.user_id, record.day.to_string()],
            |row| row.get(0),
        )?;
        record.id = Some(id);

        Ok(())
    }

    /// Get the record for a specific day.
    pub fn find_by_day(
        &self,
        user_id: i64,
        day: NaiveDate,
    ) -> Result<Option<StepRecord>, StepError> {
        self.conn
            .query_row(
                "SELECT id, user_id, day, count, distance_m, calories
                 FROM steps WHERE user_id = ?1 AND day = ?2",
                params![user_id, day.to_string()],
                parse_step_row,
            )
            .optional()
            .map_err(StepError::from)
    }

    /// Records between two days inclusive, oldest first.
    pub fn range(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StepRecord>, StepError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, day, count, distance_m, calories
             FROM steps
             WHERE user_id = ?1 AND day >= ?2 AND day <= ?3
             ORDER BY day ASC",
        )?;

        let rows = stmt.query_map(
            params![user_id, from.to_string(), to.to_string()],
            parse_step_row,
        )?;

        rows.collect::<Result<Vec<_>, _>>().map_err(StepError::from)
    }

    /// Delete the record for a day.
    ///
    /// Returns whether a row was removed.
    pub fn delete_day(&self, user_id: i64, day: NaiveDate) -> Result<bool, StepError> {
        let deleted = self.conn.execute(
            "DELETE FROM steps WHERE user_id = ?1 AND day = ?2",
            params![user_id, day.to_string()],
        )?;
        Ok(deleted > 0)
    }

    /// Total steps over the range, inclusive.
    pub fn total_between(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<u64, StepError> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM steps
             WHERE user_id = ?1 AND day >= ?2 AND day <= ?3",
            params![user_id, from.to_string(), to.to_string()],
            |row| row.get(0),
        )?;

        Ok(total as u64)
    }

    /// Mean daily count across recorded days in the range.
    ///
    /// Days without a record do not drag the average down.
    pub fn daily_average(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<f64>, StepError> {
        let counts = self.counts_between(user_id, from, to)?;
        Ok(stats::mean(&counts))
    }

    /// The day with the highest count in the range.
    ///
    /// Ties resolve to the earliest day.
    pub fn best_day(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<StepRecord>, StepError> {
        self.conn
            .query_row(
                "SELECT id, user_id, day, count, distance_m, calories
                 FROM steps
                 WHERE user_id = ?1 AND day >= ?2 AND day <= ?3
                 ORDER BY count DESC, day ASC
                 LIMIT 1",
                params![user_id, from.to_string(), to.to_string()],
                parse_step_row,
            )
            .optional()
            .map_err(StepError::from)
    }

    /// Nearest-rank percentile of the daily counts in the range.
    pub fn count_percentile(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        pct: f64,
    ) -> Result<Option<f64>, StepError> {
        let counts = self.counts_between(user_id, from, to)?;
        Ok(stats::percentile(&counts, pct))
    }

    /// Number of recorded days in the range meeting a step threshold.
    pub fn days_meeting(
        &self,
        user_id: i64,
        threshold: u32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<u32, StepError> {
        let days: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM steps
             WHERE user_id = ?1 AND day >= ?2 AND day <= ?3 AND count >= ?4",
            params![user_id, from.to_string(), to.to_string(), threshold],
            |row| row.get(0),
        )?;

        Ok(days)
    }

    /// Daily counts in the range as floats, for the stats helpers.
    fn counts_between(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<f64>, StepError> {
        let mut stmt = self.conn.prepare(
            "SELECT count FROM steps WHERE user_id = ?1 AND day >= ?2 AND day <= ?3",
        )?;

        let rows = stmt.query_map(
            params![user_id, from.to_string(), to.to_string()],
            |row| row.get::<_, i64>(0),
        )?;

        let counts = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(counts.into_iter().map(|c| c as f64).collect())
    }
}

/// Parse a database row into a StepRecord.
fn parse_step_row(row: &rusqlite::Row) -> rusqlite::Result<StepRecord> {
    let day_str: String = row.get(2)?;
    let day = NaiveDate::parse_from_str(&day_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(StepRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        day,
        count: row.get(3)?,
        distance_m: row.get(4)?,
        calories: row.get(5)?,
    })
}

fn validate(record: &StepRecord) -> Result<(), StepError> {
    if record.user_id <= 0 {
        return Err(StepError::ValidationError(
            "User id must be positive".to_string(),
        ));
    }

    if record.distance_m.map_or(false, |d| d < 0.0) {
        return Err(StepError::ValidationError(
            "Distance cannot be negative".to_string(),
        ));
    }

    if record.calories.map_or(false, |c| c < 0.0) {
        return Err(StepError::ValidationError(
            "Calories cannot be negative".to_string(),
        ));
    }

    Ok(())
}

/// Step tracking errors.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
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
                 VALUES ('walker', 'walker@example.com', 'x', datetime('now'), datetime('now'))",
                [],
            )
            .unwrap();
        db
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_upsert_sets_id_and_replaces() {
        let db = setup();
        let store = StepStore::new(db.connection());

        let mut record = StepRecord::new(1, day(1), 8000);
        store.upsert(&mut record).unwrap();
        let first_id = record.id.unwrap();
        assert!(first_id > 0);

        // Re-log the same day with a new count
        let mut replacement = StepRecord::new(1, day(1), 9500);
        store.upsert(&mut replacement).unwrap();

        assert_eq!(replacement.id, Some(first_id));

        let stored = store.find_by_day(1, day(1)).unwrap().unwrap();
        assert_eq!(stored.count, 9500);
    }

    #[test]
    fn test_range_is_ordered_and_inclusive() {
        let db = setup();
        let store = StepStore::new(db.connection());

        for (d, count) in [(3, 7000), (1, 5000), (2, 6000), (5, 9000)] {
            store.upsert(&mut StepRecord::new(1, day(d), count)).unwrap();
        }

        let records = store.range(1, day(1), day(3)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].day, day(1));
        assert_eq!(records[2].day, day(3));
    }

    #[test]
    fn test_totals_and_average() {
        let db = setup();
        let store = StepStore::new(db.connection());

        store.upsert(&mut StepRecord::new(1, day(1), 4000)).unwrap();
        store.upsert(&mut StepRecord::new(1, day(2), 6000)).unwrap();
        store.upsert(&mut StepRecord::new(1, day(4), 8000)).unwrap();

        assert_eq!(store.total_between(1, day(1), day(7)).unwrap(), 18000);

        // Average over recorded days, not calendar days
        let average = store.daily_average(1, day(1), day(7)).unwrap().unwrap();
        assert!((average - 6000.0).abs() < f64::EPSILON);

        assert_eq!(store.total_between(1, day(10), day(20)).unwrap(), 0);
        assert!(store.daily_average(1, day(10), day(20)).unwrap().is_none());
    }

    #[test]
    fn test_best_day_prefers_earliest_on_tie() {
        let db = setup();
        let store = StepStore::new(db.connection());

        store.upsert(&mut StepRecord::new(1, day(1), 9000)).unwrap();
        store.upsert(&mut StepRecord::new(1, day(2), 9000)).unwrap();
        store.upsert(&mut StepRecord::new(1, day(3), 4000)).unwrap();

        let best = store.best_day(1, day(1), day(7)).unwrap().unwrap();
        assert_eq!(best.day, day(1));
        assert_eq!(best.count, 9000);
    }

    #[test]
    fn test_percentile_and_threshold_days() {
        let db = setup();
        let store = StepStore::new(db.connection());

        for (d, count) in [(1, 2000), (2, 4000), (3, 6000), (4, 8000), (5, 10000)] {
            store.upsert(&mut StepRecord::new(1, day(d), count)).unwrap();
        }

        let median = store.count_percentile(1, day(1), day(7), 50.0).unwrap();
        assert_eq!(median, Some(6000.0));

        assert_eq!(store.days_meeting(1, 6000, day(1), day(7)).unwrap(), 3);
        assert_eq!(store.days_meeting(1, 20000, day(1), day(7)).unwrap(), 0);
    }

    #[test]
    fn test_delete_day() {
        let db = setup();
        let store = StepStore::new(db.connection());

        store.upsert(&mut StepRecord::new(1, day(1), 5000)).unwrap();

        assert!(store.delete_day(1, day(1)).unwrap());
        assert!(!store.delete_day(1, day(1)).unwrap());
        assert!(store.find_by_day(1, day(1)).unwrap().is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let db = setup();
        let store = StepStore::new(db.connection());

        let mut bad_user = StepRecord::new(0, day(1), 5000);
        assert!(matches!(
            store.upsert(&mut bad_user),
            Err(StepError::ValidationError(_))
        ));

        let mut bad_distance = StepRecord::new(1, day(1), 5000);
        bad_distance.distance_m = Some(-5.0);
        assert!(matches!(
            store.upsert(&mut bad_distance),
            Err(StepError::ValidationError(_))
        ));
    }

    #[test]
    fn test_unknown_user_is_rejected_by_foreign_key() {
        let db = setup();
        let store = StepStore::new(db.connection());

        let mut record = StepRecord::new(42, day(1), 5000);
        assert!(matches!(
            store.upsert(&mut record),
            Err(StepError::DatabaseError(_))
        ));
    }
}
