//! User account persistence.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::types::User;
use crate::storage::PreferencesError;

const USER_COLUMNS: &str = "id, username, email, password_hash, display_name, created_at, updated_at";

/// Store for user accounts.
pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    /// Create a new user store with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a user. Sets the id on success.
    pub fn insert(&self, user: &mut User) -> Result<(), AuthError> {
        validate(user)?;

        if self.find_by_username(&user.username)?.is_some() {
            return Err(AuthError::UsernameTaken(user.username.clone()));
        }
        if self.find_by_email(&user.email)?.is_some() {
            return Err(AuthError::EmailTaken(user.email.clone()));
        }

        self.conn.execute(
            "INSERT INTO users (username, email, password_hash, display_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.username,
                user.email,
                user.password_hash,
                user.display_name,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )?;

        user.id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    /// Find a user by id.
    pub fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                parse_user_row,
            )
            .optional()
            .map_err(AuthError::from)
    }

    /// Find a user by exact username.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                params![username],
                parse_user_row,
            )
            .optional()
            .map_err(AuthError::from)
    }

    /// Find a user by email, ignoring case.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE email = ?1 COLLATE NOCASE",
                    USER_COLUMNS
                ),
                params![email],
                parse_user_row,
            )
            .optional()
            .map_err(AuthError::from)
    }

    /// Update a user's email and display name. The username is fixed
    /// at registration.
    pub fn update_profile(
        &self,
        id: i64,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<(), AuthError> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(AuthError::ValidationError(
                "Email address is not valid".to_string(),
            ));
        }

        let taken: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1 COLLATE NOCASE AND id != ?2",
                params![email, id],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(AuthError::EmailTaken(email.to_string()));
        }

        let updated = self.conn.execute(
            "UPDATE users SET email = ?1, display_name = ?2, updated_at = ?3 WHERE id = ?4",
            params![email, display_name, Utc::now().to_rfc3339(), id],
        )?;

        if updated == 0 {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }

    /// Replace a user's password hash.
    pub fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<(), AuthError> {
        let updated = self.conn.execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            params![password_hash, Utc::now().to_rfc3339(), id],
        )?;

        if updated == 0 {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }

    /// Delete a user and, through the schema, all their data.
    /// Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, AuthError> {
        let deleted = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Number of registered accounts.
    pub fn count(&self) -> Result<u32, AuthError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(AuthError::from)
    }
}

/// Parse a database row into a User.
fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let created_at_str: String = row.get(5)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let updated_at_str: String = row.get(6)?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        display_name: row.get(4)?,
        created_at,
        updated_at,
    })
}

fn validate(user: &User) -> Result<(), AuthError> {
    if user.username.trim().is_empty() {
        return Err(AuthError::ValidationError(
            "Username cannot be empty".to_string(),
        ));
    }

    if user.email.trim().is_empty() || !user.email.contains('@') {
        return Err(AuthError::ValidationError(
            "Email address is not valid".to_string(),
        ));
    }

    Ok(())
}

/// Authentication and account errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Password hashing error: {0}")]
    PasswordHashing(#[from] bcrypt::BcryptError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Preferences error: {0}")]
    PreferencesError(#[from] PreferencesError),
}
