//! Food diary persistence.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::types::{FoodEntry, Meal};

/// Store for food diary entries.
pub struct FoodEntryStore<'a> {
    conn: &'a Connection,
}

impl<'a> FoodEntryStore<'a> {
    /// Create a new food entry store with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Log a food entry. Sets the id on success.
    pub fn insert(&self, entry: &mut FoodEntry) -> Result<(), FoodError> {
        validate(entry)?;

        self.conn.execute(
            "INSERT INTO food_entries (user_id, name, meal, calories, eaten_on, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.user_id,
                entry.name,
                entry.meal.as_str(),
                entry.calories,
                entry.eaten_on.to_string(),
                entry.created_at.to_rfc3339(),
            ],
        )?;

        entry.id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    /// Get an entry by id.
    pub fn get(&self, id: i64) -> Result<Option<FoodEntry>, FoodError> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, meal, calories, eaten_on, created_at
                 FROM food_entries WHERE id = ?1",
                params![id],
                parse_food_row,
            )
            .optional()
            .map_err(FoodError::from)
    }

    /// All entries for a day in logging order.
    pub fn for_day(&self, user_id: i64, day: NaiveDate) -> Result<Vec<FoodEntry>, FoodError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, meal, calories, eaten_on, created_at
             FROM food_entries
             WHERE user_id = ?1 AND eaten_on = ?2
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![user_id, day.to_string()], parse_food_row)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(FoodError::from)
    }

    /// Entries for one meal of a day in logging order.
    pub fn for_day_and_meal(
        &self,
        user_id: i64,
        day: NaiveDate,
        meal: Meal,
    ) -> Result<Vec<FoodEntry>, FoodError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, meal, calories, eaten_on, created_at
             FROM food_entries
             WHERE user_id = ?1 AND eaten_on = ?2 AND meal = ?3
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(
            params![user_id, day.to_string(), meal.as_str()],
            parse_food_row,
        )?;

        rows.collect::<Result<Vec<_>, _>>().map_err(FoodError::from)
    }

    /// Update an existing entry.
    pub fn update(&self, entry: &FoodEntry) -> Result<(), FoodError> {
        let id = entry
            .id
            .ok_or_else(|| FoodError::ValidationError("Entry has no id".to_string()))?;

        validate(entry)?;

        let updated = self.conn.execute(
            "UPDATE food_entries SET
             name = ?1, meal = ?2, calories = ?3, eaten_on = ?4
             WHERE id = ?5",
            params![
                entry.name,
                entry.meal.as_str(),
                entry.calories,
                entry.eaten_on.to_string(),
                id,
            ],
        )?;

        if updated == 0 {
            return Err(FoodError::NotFound(id));
        }

        Ok(())
    }

    /// Delete an entry. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, FoodError> {
        let deleted = self
            .conn
            .execute("DELETE FROM food_entries WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Total diary calories for a day.
    pub fn calories_for_day(&self, user_id: i64, day: NaiveDate) -> Result<f64, FoodError> {
        let total: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM(calories), 0) FROM food_entries
             WHERE user_id = ?1 AND eaten_on = ?2",
            params![user_id, day.to_string()],
            |row| row.get(0),
        )?;

        Ok(total)
    }
}

/// Parse a database row into a FoodEntry.
fn parse_food_row(row: &rusqlite::Row) -> rusqlite::Result<FoodEntry> {
    let meal_str: String = row.get(3)?;
    let meal = Meal::parse(&meal_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("Unknown meal: {}", meal_str).into(),
        )
    })?;

    let eaten_on_str: String = row.get(5)?;
    let eaten_on = NaiveDate::parse_from_str(&eaten_on_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at_str: String = row.get(6)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(FoodEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        meal,
        calories: row.get(4)?,
        eaten_on,
        created_at,
    })
}

fn validate(entry: &FoodEntry) -> Result<(), FoodError> {
    if entry.user_id <= 0 {
        return Err(FoodError::ValidationError(
            "User id must be positive".to_string(),
        ));
    }

    if entry.name.trim().is_empty() {
        return Err(FoodError::ValidationError(
            "Food name cannot be empty".to_string(),
        ));
    }

    if entry.calories < 0.0 {
        return Err(FoodError::ValidationError(
            "Calories cannot be negative".to_string(),
        ));
    }

    Ok(())
}

/// Food diary errors.
#[derive(Debug, thiserror::Error)]
pub enum FoodError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Food entry not found: {0}")]
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

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn entry(name: &str, meal: Meal, calories: f64) -> FoodEntry {
        FoodEntry::new(1, name.to_string(), meal, calories, day())
    }

    #[test]
    fn test_insert_and_day_queries() {
        let db = setup();
        let store = FoodEntryStore::new(db.connection());

        store
            .insert(&mut entry("Oatmeal", Meal::Breakfast, 310.0))
            .unwrap();
        store
            .insert(&mut entry("Banana", Meal::Breakfast, 90.0))
            .unwrap();
        store
            .insert(&mut entry("Pasta", Meal::Dinner, 650.0))
            .unwrap();

        let all = store.for_day(1, day()).unwrap();
        assert_eq!(all.len(), 3);

        let breakfast = store.for_day_and_meal(1, day(), Meal::Breakfast).unwrap();
        assert_eq!(breakfast.len(), 2);
        assert_eq!(breakfast[0].name, "Oatmeal");

        let total = store.calories_for_day(1, day()).unwrap();
        assert!((total - 1050.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_and_delete() {
        let db = setup();
        let store = FoodEntryStore::new(db.connection());

        let mut logged = entry("Snack bar", Meal::Snack, 200.0);
        store.insert(&mut logged).unwrap();

        logged.name = "Protein bar".to_string();
        logged.calories = 220.0;
        store.update(&logged).unwrap();

        let stored = store.get(logged.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.name, "Protein bar");
        assert!((stored.calories - 220.0).abs() < f64::EPSILON);

        assert!(store.delete(logged.id.unwrap()).unwrap());
        assert!(store.get(logged.id.unwrap()).unwrap().is_none());
    }

    #[test]
    fn test_empty_day_total_is_zero() {
        let db = setup();
        let store = FoodEntryStore::new(db.connection());

        let total = store.calories_for_day(1, day()).unwrap();
        assert_eq!(total, 0.0);
    }

    #[test]
    fn test_validation() {
        let db = setup();
        let store = FoodEntryStore::new(db.connection());

        let mut nameless = entry("   ", Meal::Lunch, 100.0);
        assert!(matches!(
            store.insert(&mut nameless),
            Err(FoodError::ValidationError(_))
        ));

        let mut negative = entry("Mystery", Meal::Lunch, -10.0);
        assert!(matches!(
            store.insert(&mut negative),
            Err(FoodError::ValidationError(_))
        ));
    }
}
