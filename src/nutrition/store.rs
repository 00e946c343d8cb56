//! Nutrient record persistence and daily aggregation.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::types::{DailyNutrition, NutritionAverages, NutritionEntry};

/// Store for nutrient-level records.
pub struct NutritionStore<'a> {
    conn: &'a Connection,
}

impl<'a> NutritionStore<'a> {
    /// Create a new nutrition store with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Log a nutrient record. Sets the id on success.
    pub fn insert(&self, entry: &mut NutritionEntry) -> Result<(), NutritionError> {
        validate(entry)?;

        self.conn.execute(
            "INSERT INTO nutrition_entries
             (user_id, day, calories, protein_g, carbs_g, fat_g, fiber_g, sugar_g,
              sodium_mg, water_ml, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.user_id,
                entry.day.to_string(),
                entry.calories,
                entry.protein_g,
                entry.carbs_g,
                entry.fat_g,
                entry.fiber_g,
                entry.sugar_g,
                entry.sodium_mg,
                entry.water_ml,
                entry.created_at.to_rfc3339(),
            ],
        )?;

        entry.id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    /// Get a record by id.
    pub fn get(&self, id: i64) -> Result<Option<NutritionEntry>, NutritionError> {
        self.conn
            .query_row(
                "SELECT id, user_id, day, calories, protein_g, carbs_g, fat_g, fiber_g,
                        sugar_g, sodium_mg, water_ml, created_at
                 FROM nutrition_entries WHERE id = ?1",
                params![id],
                parse_nutrition_row,
            )
            .optional()
            .map_err(NutritionError::from)
    }

    /// All records for a day in logging order.
    pub fn for_day(
        &self,
        user_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<NutritionEntry>, NutritionError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, day, calories, protein_g, carbs_g, fat_g, fiber_g,
                    sugar_g, sodium_mg, water_ml, created_at
             FROM nutrition_entries
             WHERE user_id = ?1 AND day = ?2
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![user_id, day.to_string()], parse_nutrition_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(NutritionError::from)
    }

    /// Records between two days inclusive, oldest first.
    pub fn range(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NutritionEntry>, NutritionError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, day, calories, protein_g, carbs_g, fat_g, fiber_g,
                    sugar_g, sodium_mg, water_ml, created_at
             FROM nutrition_entries
             WHERE user_id = ?1 AND day >= ?2 AND day <= ?3
             ORDER BY day ASC, id ASC",
        )?;

        let rows = stmt.query_map(
            params![user_id, from.to_string(), to.to_string()],
            parse_nutrition_row,
        )?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(NutritionError::from)
    }

    /// Update an existing record.
    pub fn update(&self, entry: &NutritionEntry) -> Result<(), NutritionError> {
        let id = entry
            .id
            .ok_or_else(|| NutritionError::ValidationError("Entry has no id".to_string()))?;

        validate(entry)?;

        let updated = self.conn.execute(
            "UPDATE nutrition_entries SET
             day = ?1, calories = ?2, protein_g = ?3, carbs_g = ?4, fat_g = ?5,
             fiber_g = ?6, sugar_g = ?7, sodium_mg = ?8, water_ml = ?9
             WHERE id = ?10",
            params![
                entry.day.to_string(),
                entry.calories,
                entry.protein_g,
                entry.carbs_g,
                entry.fat_g,
                entry.fiber_g,
                entry.sugar_g,
                entry.sodium_mg,
                entry.water_ml,
                id,
            ],
        )?;

        if updated == 0 {
            return Err(NutritionError::NotFound(id));
        }

        Ok(())
    }

    /// Delete a record. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, NutritionError> {
        let deleted = self
            .conn
            .execute("DELETE FROM nutrition_entries WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Summed nutrients for a day.
    ///
    /// Returns `None` when the day has no records.
    pub fn daily_summary(
        &self,
        user_id: i64,
        day: NaiveDate,
    ) -> Result<Option<DailyNutrition>, NutritionError> {
        let row = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(calories), 0),
                    COALESCE(SUM(protein_g), 0),
                    COALESCE(SUM(carbs_g), 0),
                    COALESCE(SUM(fat_g), 0),
                    COALESCE(SUM(fiber_g), 0),
                    COALESCE(SUM(sugar_g), 0),
                    COALESCE(SUM(sodium_mg), 0),
                    COALESCE(SUM(water_ml), 0)
             FROM nutrition_entries
             WHERE user_id = ?1 AND day = ?2",
            params![user_id, day.to_string()],
            |row| {
                let count: u32 = row.get(0)?;
                Ok((
                    count,
                    DailyNutrition {
                        day,
                        calories: row.get(1)?,
                        protein_g: row.get(2)?,
                        carbs_g: row.get(3)?,
                        fat_g: row.get(4)?,
                        fiber_g: row.get(5)?,
                        sugar_g: row.get(6)?,
                        sodium_mg: row.get(7)?,
                        water_ml: row.get(8)?,
                    },
                ))
            },
        )?;

        let (count, summary) = row;
        if count == 0 {
            return Ok(None);
        }

        Ok(Some(summary))
    }

    /// Mean daily totals across the recorded days of a range.
    ///
    /// Days without records are left out of the mean. Returns `None`
    /// when no day in the range has records.
    pub fn average_between(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<NutritionAverages>, NutritionError> {
        let averages = self
            .conn
            .query_row(
                "SELECT COUNT(*), AVG(calories), AVG(protein_g), AVG(carbs_g),
                        AVG(fat_g), AVG(water_ml)
                 FROM (SELECT day,
                              SUM(calories) AS calories,
                              SUM(protein_g) AS protein_g,
                              SUM(carbs_g) AS carbs_g,
                              SUM(fat_g) AS fat_g,
                              SUM(water_ml) AS water_ml
                       FROM nutrition_entries
                       WHERE user_id = ?1 AND day >= ?2 AND day <= ?3
                       GROUP BY day)",
                params![user_id, from.to_string(), to.to_string()],
                |row| {
                    let recorded_days: u32 = row.get(0)?;
                    if recorded_days == 0 {
                        return Ok(None);
                    }

                    Ok(Some(NutritionAverages {
                        recorded_days,
                        calories: row.get(1)?,
                        protein_g: row.get(2)?,
                        carbs_g: row.get(3)?,
                        fat_g: row.get(4)?,
                        water_ml: row.get(5)?,
                    }))
                },
            )?;

        Ok(averages)
    }
}

/// Parse a database row into a NutritionEntry.
fn parse_nutrition_row(row: &rusqlite::Row) -> rusqlite::Result<NutritionEntry> {
    let day_str: String = row.get(2)?;
    let day = NaiveDate::parse_from_str(&day_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at_str: String = row.get(11)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(NutritionEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        day,
        calories: row.get(3)?,
        protein_g: row.get(4)?,
        carbs_g: row.get(5)?,
        fat_g: row.get(6)?,
        fiber_g: row.get(7)?,
        sugar_g: row.get(8)?,
        sodium_mg: row.get(9)?,
        water_ml: row.get(10)?,
        created_at,
    })
}

fn validate(entry: &NutritionEntry) -> Result<(), NutritionError> {
    if entry.user_id <= 0 {
        return Err(NutritionError::ValidationError(
            "User id must be positive".to_string(),
        ));
    }

    let nutrients = [
        ("calories", entry.calories),
        ("protein", entry.protein_g),
        ("carbs", entry.carbs_g),
        ("fat", entry.fat_g),
        ("fiber", entry.fiber_g),
        ("sugar", entry.sugar_g),
        ("sodium", entry.sodium_mg),
        ("water", entry.water_ml),
    ];

    for (name, value) in nutrients {
        if value < 0.0 {
            return Err(NutritionError::ValidationError(format!(
                "{} cannot be negative",
                name
            )));
        }
    }

    Ok(())
}

/// Nutrition record errors.
#[derive(Debug, thiserror::Error)]
pub enum NutritionError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Nutrition entry not found: {0}")]
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
                 VALUES ('eater', 'eater@example.com', 'x', datetime('now'), datetime('now'))",
                [],
            )
            .unwrap();
        db
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn entry(d: u32, calories: f64, protein: f64) -> NutritionEntry {
        let mut e = NutritionEntry::new(1, day(d));
        e.calories = calories;
        e.protein_g = protein;
        e
    }

    #[test]
    fn test_insert_and_range() {
        let db = setup();
        let store = NutritionStore::new(db.connection());

        store.insert(&mut entry(2, 600.0, 30.0)).unwrap();
        store.insert(&mut entry(1, 500.0, 25.0)).unwrap();
        store.insert(&mut entry(3, 700.0, 35.0)).unwrap();

        let records = store.range(1, day(1), day(2)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].day, day(1));
        assert_eq!(records[1].day, day(2));
    }

    #[test]
    fn test_daily_summary_sums_records() {
        let db = setup();
        let store = NutritionStore::new(db.connection());

        let mut morning = entry(1, 600.0, 30.0);
        morning.water_ml = 500.0;
        store.insert(&mut morning).unwrap();

        let mut evening = entry(1, 900.0, 45.0);
        evening.water_ml = 750.0;
        store.insert(&mut evening).unwrap();

        let summary = store.daily_summary(1, day(1)).unwrap().unwrap();
        assert!((summary.calories - 1500.0).abs() < f64::EPSILON);
        assert!((summary.protein_g - 75.0).abs() < f64::EPSILON);
        assert!((summary.water_ml - 1250.0).abs() < f64::EPSILON);

        assert!(store.daily_summary(1, day(9)).unwrap().is_none());
    }

    #[test]
    fn test_average_between_uses_recorded_days() {
        let db = setup();
        let store = NutritionStore::new(db.connection());

        // Two records on day 1, one on day 3, nothing on day 2
        store.insert(&mut entry(1, 800.0, 40.0)).unwrap();
        store.insert(&mut entry(1, 1200.0, 60.0)).unwrap();
        store.insert(&mut entry(3, 1600.0, 70.0)).unwrap();

        let averages = store.average_between(1, day(1), day(7)).unwrap().unwrap();
        assert_eq!(averages.recorded_days, 2);
        // (2000 + 1600) / 2
        assert!((averages.calories - 1800.0).abs() < f64::EPSILON);
        assert!((averages.protein_g - 85.0).abs() < f64::EPSILON);

        assert!(store.average_between(1, day(10), day(20)).unwrap().is_none());
    }

    #[test]
    fn test_update_and_delete() {
        let db = setup();
        let store = NutritionStore::new(db.connection());

        let mut record = entry(1, 500.0, 20.0);
        store.insert(&mut record).unwrap();

        record.calories = 550.0;
        record.fiber_g = 8.0;
        store.update(&record).unwrap();

        let stored = store.get(record.id.unwrap()).unwrap().unwrap();
        assert!((stored.calories - 550.0).abs() < f64::EPSILON);
        assert!((stored.fiber_g - 8.0).abs() < f64::EPSILON);

        assert!(store.delete(record.id.unwrap()).unwrap());
        assert!(!store.delete(record.id.unwrap()).unwrap());
    }

    #[test]
    fn test_validation_rejects_negative_nutrients() {
        let db = setup();
        let store = NutritionStore::new(db.connection());

        let mut record = entry(1, 500.0, 20.0);
        record.sodium_mg = -1.0;

        assert!(matches!(
            store.insert(&mut record),
            Err(NutritionError::ValidationError(_))
        ));
    }
}
