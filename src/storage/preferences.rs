//! Local key-value preferences backed by a TOML file.
//!
//! Holds the signed-in session flag and the pending password reset
//! token. Everything else lives in the database.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// How long a password reset token stays valid.
const RESET_TOKEN_TTL_MINS: i64 = 30;

/// A pending password reset token.
///
/// Only one token exists per install; issuing a new one replaces any
/// previous token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetToken {
    /// Opaque token value handed to the user
    pub token: Uuid,
    /// User the token was issued for
    pub user_id: i64,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    /// Issue a fresh token for the given user.
    pub fn issue(user_id: i64) -> Self {
        Self {
            token: Uuid::new_v4(),
            user_id,
            expires_at: Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINS),
        }
    }

    /// Whether the token has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Persisted preference values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Currently signed-in user, if any
    pub session_user_id: Option<i64>,
    /// Pending password reset token, if any
    pub reset_token: Option<ResetToken>,
}

/// Preference store bound to a file path.
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    /// Open the store at the given path, loading existing values if
    /// the file exists.
    pub fn open(path: PathBuf) -> Result<Self, PreferencesError> {
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| PreferencesError::IoError(e.to_string()))?;

            toml::from_str(&content).map_err(|e| PreferencesError::ParseError(e.to_string()))?
        } else {
            Preferences::default()
        };

        Ok(Self { path, data })
    }

    /// Open the store at the platform default location.
    pub fn open_default() -> Result<Self, PreferencesError> {
        Self::open(get_preferences_path())
    }

    /// The currently signed-in user, if any.
    pub fn session_user(&self) -> Option<i64> {
        self.data.session_user_id
    }

    /// Record a signed-in session for the given user.
    pub fn set_session_user(&mut self, user_id: i64) -> Result<(), PreferencesError> {
        self.data.session_user_id = Some(user_id);
        self.save()
    }

    /// Clear the signed-in session.
    pub fn clear_session(&mut self) -> Result<(), PreferencesError> {
        self.data.session_user_id = None;
        self.save()
    }

    /// The pending reset token, if any.
    pub fn reset_token(&self) -> Option<&ResetToken> {
        self.data.reset_token.as_ref()
    }

    /// Store a reset token, replacing any previous one.
    pub fn store_reset_token(&mut self, token: ResetToken) -> Result<(), PreferencesError> {
        self.data.reset_token = Some(token);
        self.save()
    }

    /// Remove the pending reset token.
    pub fn clear_reset_token(&mut self) -> Result<(), PreferencesError> {
        self.data.reset_token = None;
        self.save()
    }

    /// Save values to disk.
    fn save(&self) -> Result<(), PreferencesError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PreferencesError::IoError(e.to_string()))?;
        }

        let content = toml::to_string_pretty(&self.data)
            .map_err(|e| PreferencesError::SerializeError(e.to_string()))?;

        std::fs::write(&self.path, content).map_err(|e| PreferencesError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "providenceit", "FitLog")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the preferences file path.
pub fn get_preferences_path() -> PathBuf {
    get_data_dir().join("preferences.toml")
}

/// Preference store errors.
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> PreferencesStore {
        PreferencesStore::open(dir.path().join("preferences.toml"))
            .expect("Failed to open preferences")
    }

    #[test]
    fn test_session_round_trip() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut store = store_in(&dir);
        assert_eq!(store.session_user(), None);

        store.set_session_user(7).expect("Failed to set session");
        assert_eq!(store.session_user(), Some(7));

        // Reopen from disk
        let reloaded = store_in(&dir);
        assert_eq!(reloaded.session_user(), Some(7));

        store.clear_session().expect("Failed to clear session");
        assert_eq!(store.session_user(), None);
    }

    #[test]
    fn test_reset_token_replaced_on_reissue() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut store = store_in(&dir);

        let first = ResetToken::issue(1);
        store
            .store_reset_token(first.clone())
            .expect("Failed to store token");

        let second = ResetToken::issue(1);
        store
            .store_reset_token(second.clone())
            .expect("Failed to store token");

        let pending = store.reset_token().expect("Token missing");
        assert_eq!(pending.token, second.token);
        assert_ne!(pending.token, first.token);
    }

    #[test]
    fn test_reset_token_expiry() {
        let token = ResetToken::issue(1);

        assert!(!token.is_expired(Utc::now()));
        assert!(token.is_expired(Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINS + 1)));
    }
}
