//! Sign-in flow on top of the user store and local preferences.
//!
//! The database holds accounts and credential hashes; the preferences
//! file holds the session flag and any pending reset token. This
//! service is the only place the two are combined.

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use super::password::{self, MIN_PASSWORD_LEN};
use super::store::{AuthError, UserStore};
use super::types::{NewUser, User};
use crate::storage::{PreferencesStore, ResetToken};

/// Account registration and session management.
pub struct AuthService<'a> {
    store: UserStore<'a>,
    preferences: PreferencesStore,
}

impl<'a> AuthService<'a> {
    /// Create an auth service over a database connection and a
    /// preference store.
    pub fn new(conn: &'a Connection, preferences: PreferencesStore) -> Self {
        Self {
            store: UserStore::new(conn),
            preferences,
        }
    }

    /// Create an account. Does not sign the new user in.
    pub fn register(&self, new_user: NewUser) -> Result<User, AuthError> {
        validate_new_password(&new_user.password)?;

        let now = Utc::now();
        let mut user = User {
            id: None,
            username: new_user.username.trim().to_string(),
            email: new_user.email.trim().to_string(),
            password_hash: password::hash_password(&new_user.password)?,
            display_name: new_user.display_name,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&mut user)?;
        tracing::info!(username = %user.username, "User registered");

        Ok(user)
    }

    /// Sign in with a username or email address.
    pub fn login(&mut self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let identifier = identifier.trim();

        let found = match self.store.find_by_username(identifier)? {
            Some(user) => Some(user),
            None => self.store.find_by_email(identifier)?,
        };

        // One error for both unknown user and wrong password
        let user = found.ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let id = user_id(&user)?;
        self.preferences.set_session_user(id)?;
        tracing::info!(user_id = id, "User signed in");

        Ok(user)
    }

    /// Sign out, clearing the session flag.
    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.preferences.clear_session()?;
        Ok(())
    }

    /// The signed-in user, if any.
    ///
    /// A session flag left behind by a deleted account is cleared
    /// rather than surfaced.
    pub fn current_user(&mut self) -> Result<Option<User>, AuthError> {
        let id = match self.preferences.session_user() {
            Some(id) => id,
            None => return Ok(None),
        };

        match self.store.find_by_id(id)? {
            Some(user) => Ok(Some(user)),
            None => {
                self.preferences.clear_session()?;
                Ok(None)
            }
        }
    }

    /// Change a user's password, verifying the current one first.
    pub fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .store
            .find_by_id(user_id)?
            .ok_or(AuthError::UserNotFound)?;

        if !password::verify_password(current_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        validate_new_password(new_password)?;
        let hash = password::hash_password(new_password)?;
        self.store.update_password_hash(user_id, &hash)?;

        Ok(())
    }

    /// Issue a password reset token for the account behind `email`.
    ///
    /// The token is handed back for delivery and replaces any earlier
    /// one.
    pub fn request_password_reset(&mut self, email: &str) -> Result<ResetToken, AuthError> {
        let user = self
            .store
            .find_by_email(email.trim())?
            .ok_or(AuthError::UserNotFound)?;

        let token = ResetToken::issue(user_id(&user)?);
        self.preferences.store_reset_token(token.clone())?;
        tracing::info!(user_id = token.user_id, "Password reset token issued");

        Ok(token)
    }

    /// Redeem a reset token and set a new password.
    ///
    /// The token is cleared only on success, so a mistyped attempt
    /// does not force another round of issuing.
    pub fn reset_password(&mut self, token: Uuid, new_password: &str) -> Result<(), AuthError> {
        let stored = match self.preferences.reset_token() {
            Some(stored) => stored.clone(),
            None => return Err(AuthError::InvalidToken),
        };

        if stored.token != token {
            return Err(AuthError::InvalidToken);
        }
        if stored.is_expired(Utc::now()) {
            return Err(AuthError::TokenExpired);
        }

        validate_new_password(new_password)?;
        let hash = password::hash_password(new_password)?;
        self.store.update_password_hash(stored.user_id, &hash)?;
        self.preferences.clear_reset_token()?;

        Ok(())
    }
}

fn validate_new_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordValidation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(())
}

fn user_id(user: &User) -> Result<i64, AuthError> {
    user.id
        .ok_or_else(|| AuthError::ValidationError("User row has no id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::Duration;

    fn preferences_in(dir: &tempfile::TempDir) -> PreferencesStore {
        PreferencesStore::open(dir.path().join("preferences.toml"))
            .expect("Failed to open preferences")
    }

    fn sam() -> NewUser {
        NewUser {
            username: "sam".to_string(),
            email: "sam@example.com".to_string(),
            password: "hunter2hunter2".to_string(),
            display_name: Some("Sam".to_string()),
        }
    }

    #[test]
    fn test_register_and_login() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut auth = AuthService::new(db.connection(), preferences_in(&dir));

        let user = auth.register(sam()).unwrap();
        assert!(user.id.is_some());
        assert_ne!(user.password_hash, "hunter2hunter2");

        // By username, then by email with different casing
        auth.login("sam", "hunter2hunter2").unwrap();
        auth.login("SAM@example.com", "hunter2hunter2").unwrap();

        assert!(matches!(
            auth.login("sam", "wrong password"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "hunter2hunter2"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_register_rejects_short_password() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let auth = AuthService::new(db.connection(), preferences_in(&dir));

        let mut weak = sam();
        weak.password = "short".to_string();
        assert!(matches!(
            auth.register(weak),
            Err(AuthError::PasswordValidation(_))
        ));
    }

    #[test]
    fn test_session_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut auth = AuthService::new(db.connection(), preferences_in(&dir));

        assert!(auth.current_user().unwrap().is_none());

        auth.register(sam()).unwrap();
        auth.login("sam", "hunter2hunter2").unwrap();

        let current = auth.current_user().unwrap().unwrap();
        assert_eq!(current.username, "sam");

        auth.logout().unwrap();
        assert!(auth.current_user().unwrap().is_none());
    }

    #[test]
    fn test_stale_session_is_cleared() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut auth = AuthService::new(db.connection(), preferences_in(&dir));

        let user = auth.register(sam()).unwrap();
        auth.login("sam", "hunter2hunter2").unwrap();

        // The account disappears underneath the session
        UserStore::new(db.connection())
            .delete(user.id.unwrap())
            .unwrap();

        assert!(auth.current_user().unwrap().is_none());
    }

    #[test]
    fn test_change_password() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut auth = AuthService::new(db.connection(), preferences_in(&dir));

        let user = auth.register(sam()).unwrap();
        let id = user.id.unwrap();

        assert!(matches!(
            auth.change_password(id, "wrong password", "a whole new one"),
            Err(AuthError::InvalidCredentials)
        ));

        auth.change_password(id, "hunter2hunter2", "a whole new one")
            .unwrap();

        auth.login("sam", "a whole new one").unwrap();
        assert!(matches!(
            auth.login("sam", "hunter2hunter2"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_reset_flow() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut auth = AuthService::new(db.connection(), preferences_in(&dir));

        auth.register(sam()).unwrap();

        assert!(matches!(
            auth.request_password_reset("nobody@example.com"),
            Err(AuthError::UserNotFound)
        ));

        let token = auth.request_password_reset("sam@example.com").unwrap();

        // A wrong token leaves the real one usable
        assert!(matches!(
            auth.reset_password(Uuid::new_v4(), "a whole new one"),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            auth.reset_password(token.token, "short"),
            Err(AuthError::PasswordValidation(_))
        ));

        auth.reset_password(token.token, "a whole new one").unwrap();
        auth.login("sam", "a whole new one").unwrap();

        // The token was single-use
        assert!(matches!(
            auth.reset_password(token.token, "yet another one"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let mut preferences = preferences_in(&dir);
        let mut token = ResetToken::issue(1);
        token.expires_at = Utc::now() - Duration::minutes(1);
        preferences.store_reset_token(token.clone()).unwrap();

        let mut auth = AuthService::new(db.connection(), preferences);
        assert!(matches!(
            auth.reset_password(token.token, "a whole new one"),
            Err(AuthError::TokenExpired)
        ));
    }
}
