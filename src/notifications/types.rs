//! Notification types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery attempts made for one notification before it is marked
/// failed and no longer retried.
pub const MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    GoalReminder,
    GoalAchieved,
    WorkoutReminder,
    StreakMilestone,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::GoalReminder => "goal_reminder",
            NotificationKind::GoalAchieved => "goal_achieved",
            NotificationKind::WorkoutReminder => "workout_reminder",
            NotificationKind::StreakMilestone => "streak_milestone",
            NotificationKind::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "goal_reminder" => Some(NotificationKind::GoalReminder),
            "goal_achieved" => Some(NotificationKind::GoalAchieved),
            "workout_reminder" => Some(NotificationKind::WorkoutReminder),
            "streak_milestone" => Some(NotificationKind::StreakMilestone),
            "system" => Some(NotificationKind::System),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            NotificationKind::GoalReminder => "Goal reminder",
            NotificationKind::GoalAchieved => "Goal achieved",
            NotificationKind::WorkoutReminder => "Workout reminder",
            NotificationKind::StreakMilestone => "Streak milestone",
            NotificationKind::System => "System",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Where a notification is in its delivery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DeliveryStatus::Pending),
            "sent" => Some(DeliveryStatus::Sent),
            "failed" => Some(DeliveryStatus::Failed),
            "cancelled" => Some(DeliveryStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A queued or delivered notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Option<i64>,
    pub user_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Free-form context for the client, e.g. the goal id a reminder
    /// points at.
    pub payload: Option<serde_json::Value>,
    pub status: DeliveryStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a pending notification due at `scheduled_at`.
    pub fn new(
        user_id: i64,
        kind: NotificationKind,
        title: String,
        body: String,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            user_id,
            kind,
            title,
            body,
            payload: None,
            status: DeliveryStatus::Pending,
            attempts: 0,
            last_error: None,
            scheduled_at,
            sent_at: None,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Whether another delivery attempt may still be made.
    pub fn can_retry(&self) -> bool {
        self.status == DeliveryStatus::Pending && self.attempts < MAX_DELIVERY_ATTEMPTS
    }
}
