//! Accounts and authentication module.
//!
//! Local-first authentication:
//! - Accounts with bcrypt credential hashes in the database
//! - A signed-in session flag in the preferences file
//! - Password reset through a short-lived single token

pub mod password;
pub mod service;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use service::AuthService;
pub use store::{AuthError, UserStore};
pub use types::{NewUser, User};
