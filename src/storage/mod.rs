//! Storage module for the database and local preferences.

pub mod database;
pub mod preferences;
pub mod schema;

pub use database::{Database, DatabaseError};
pub use preferences::{Preferences, PreferencesError, PreferencesStore, ResetToken};
