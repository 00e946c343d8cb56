//! Notification queue module.
//!
//! Tracks in-app notifications from queueing through delivery:
//! - Pending rows due for delivery, in schedule order
//! - Attempt counting with a retry cap
//! - Read state and cleanup of resolved notifications

pub mod store;
pub mod types;

// Re-exports for convenience
pub use store::{NotificationError, NotificationStore};
pub use types::{DeliveryStatus, Notification, NotificationKind, MAX_DELIVERY_ATTEMPTS};
