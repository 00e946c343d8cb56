//! Goal management.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::completion::{evaluate, GoalEvaluation};
use super::types::{Goal, GoalKind, GoalStatus};

/// Manager for user goals.
pub struct GoalManager<'a> {
    conn: &'a Connection,
}

impl<'a> GoalManager<'a> {
    /// Create a new goal manager with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new goal. Sets the id on success.
    pub fn create(&self, goal: &mut Goal) -> Result<(), GoalError> {
        validate(goal)?;

        self.conn.execute(
            "INSERT INTO goals
             (user_id, title, kind, target_value, start_value, current_value,
              start_date, due_date, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                goal.user_id,
                goal.title,
                goal.kind.as_str(),
                goal.target_value,
                goal.start_value,
                goal.current_value,
                goal.start_date.to_string(),
                goal.due_date.to_string(),
                goal.status.as_str(),
                goal.created_at.to_rfc3339(),
                goal.updated_at.to_rfc3339(),
            ],
        )?;

        goal.id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    /// Get a goal by id.
    pub fn get(&self, id: i64) -> Result<Option<Goal>, GoalError> {
        self.conn
            .query_row(
                "SELECT id, user_id, title, kind, target_value, start_value, current_value,
                        start_date, due_date, status, created_at, updated_at
                 FROM goals WHERE id = ?1",
                params![id],
                parse_goal_row,
            )
            .optional()
            .map_err(GoalError::from)
    }

    /// All goals for a user, nearest due date first.
    pub fn for_user(&self, user_id: i64) -> Result<Vec<Goal>, GoalError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, kind, target_value, start_value, current_value,
                    start_date, due_date, status, created_at, updated_at
             FROM goals
             WHERE user_id = ?1
             ORDER BY due_date ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![user_id], parse_goal_row)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(GoalError::from)
    }

    /// Active goals for a user, nearest due date first.
    pub fn active(&self, user_id: i64) -> Result<Vec<Goal>, GoalError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, kind, target_value, start_value, current_value,
                    start_date, due_date, status, created_at, updated_at
             FROM goals
             WHERE user_id = ?1 AND status = 'active'
             ORDER BY due_date ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![user_id], parse_goal_row)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(GoalError::from)
    }

    /// Update a goal's definition. Bumps `updated_at`.
    pub fn update(&self, goal: &Goal) -> Result<(), GoalError> {
        let id = goal
            .id
            .ok_or_else(|| GoalError::ValidationError("Goal has no id".to_string()))?;

        validate(goal)?;
        let now = Utc::now();

        let updated = self.conn.execute(
            "UPDATE goals SET
             title = ?1, kind = ?2, target_value = ?3, start_value = ?4,
             current_value = ?5, start_date = ?6, due_date = ?7, status = ?8,
             updated_at = ?9
             WHERE id = ?10",
            params![
                goal.title,
                goal.kind.as_str(),
                goal.target_value,
                goal.start_value,
                goal.current_value,
                goal.start_date.to_string(),
                goal.due_date.to_string(),
                goal.status.as_str(),
                now.to_rfc3339(),
                id,
            ],
        )?;

        if updated == 0 {
            return Err(GoalError::NotFound(id));
        }

        Ok(())
    }

    /// Record a new current value and apply any status change it
    /// causes, as of `today`.
    ///
    /// An active goal that reaches its target becomes completed; one
    /// past its due date without reaching it becomes expired.
    /// Completed, expired, and cancelled goals keep their status.
    pub fn update_progress(
        &self,
        id: i64,
        current_value: f64,
        today: NaiveDate,
    ) -> Result<GoalEvaluation, GoalError> {
        let mut goal = self.get(id)?.ok_or(GoalError::NotFound(id))?;

        goal.current_value = current_value;
        let evaluation = evaluate(&goal, today);

        let new_status = if goal.status.is_active() {
            if evaluation.completed {
                GoalStatus::Completed
            } else if evaluation.expired {
                GoalStatus::Expired
            } else {
                GoalStatus::Active
            }
        } else {
            goal.status
        };

        self.conn.execute(
            "UPDATE goals SET current_value = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                current_value,
                new_status.as_str(),
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;

        if goal.status.is_active() && new_status == GoalStatus::Completed {
            tracing::info!(goal_id = id, "Goal completed");
        }

        Ok(evaluation)
    }

    /// Cancel an active goal.
    pub fn cancel(&self, id: i64) -> Result<(), GoalError> {
        let goal = self.get(id)?.ok_or(GoalError::NotFound(id))?;

        if !goal.status.is_active() {
            return Err(GoalError::ValidationError(format!(
                "Only active goals can be cancelled, this one is {}",
                goal.status
            )));
        }

        self.conn.execute(
            "UPDATE goals SET status = 'cancelled', updated_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;

        Ok(())
    }

    /// Delete a goal. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, GoalError> {
        let deleted = self
            .conn
            .execute("DELETE FROM goals WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Share of a user's resolved goals that were completed.
    ///
    /// Cancelled goals are left out on both sides. Returns `None`
    /// until at least one goal has completed or expired.
    pub fn completion_rate(&self, user_id: i64) -> Result<Option<f64>, GoalError> {
        let (completed, expired): (u32, u32) = self.conn.query_row(
            "SELECT COUNT(CASE WHEN status = 'completed' THEN 1 END),
                    COUNT(CASE WHEN status = 'expired' THEN 1 END)
             FROM goals WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let resolved = completed + expired;
        if resolved == 0 {
            return Ok(None);
        }

        Ok(Some(completed as f64 / resolved as f64))
    }
}

/// Parse a database row into a Goal.
fn parse_goal_row(row: &rusqlite::Row) -> rusqlite::Result<Goal> {
    let kind_str: String = row.get(3)?;
    let kind = GoalKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("Unknown goal kind: {}", kind_str).into(),
        )
    })?;

    let start_date_str: String = row.get(7)?;
    let start_date = NaiveDate::parse_from_str(&start_date_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let due_date_str: String = row.get(8)?;
    let due_date = NaiveDate::parse_from_str(&due_date_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status_str: String = row.get(9)?;
    let status = GoalStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            rusqlite::types::Type::Text,
            format!("Unknown goal status: {}", status_str).into(),
        )
    })?;

    let created_at_str: String = row.get(10)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let updated_at_str: String = row.get(11)?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        kind,
        target_value: row.get(4)?,
        start_value: row.get(5)?,
        current_value: row.get(6)?,
        start_date,
        due_date,
        status,
        created_at,
        updated_at,
    })
}

fn validate(goal: &Goal) -> Result<(), GoalError> {
    if goal.user_id <= 0 {
        return Err(GoalError::ValidationError(
            "User id must be positive".to_string(),
        ));
    }

    if goal.title.trim().is_empty() {
        return Err(GoalError::ValidationError(
            "Goal title cannot be empty".to_string(),
        ));
    }

    if goal.target_value <= 0.0 {
        return Err(GoalError::ValidationError(
            "Target value must be positive".to_string(),
        ));
    }

    if goal.due_date < goal.start_date {
        return Err(GoalError::ValidationError(
            "Due date cannot be before the start date".to_string(),
        ));
    }

    if goal.kind == GoalKind::Weight && goal.start_value <= 0.0 {
        return Err(GoalError::ValidationError(
            "Weight goals need a starting weight".to_string(),
        ));
    }

    Ok(())
}

/// Goal management errors.
#[derive(Debug, thiserror::Error)]
pub enum GoalError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Goal not found: {0}")]
    NotFound(i64),
}
