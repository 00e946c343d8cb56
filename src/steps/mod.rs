//! Daily step tracking.
//!
//! One record per user per day, with range queries and the
//! aggregations the dashboard charts are built from.

pub mod store;
pub mod types;

// Re-exports for convenience
pub use store::{StepError, StepStore};
pub use types::StepRecord;
