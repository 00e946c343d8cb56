//! Notification persistence and delivery tracking.
//!
//! Notifications are queued as pending rows and picked up by whatever
//! delivery mechanism the platform offers. The store records each
//! attempt's outcome; a notification that keeps failing is parked as
//! failed after [`MAX_DELIVERY_ATTEMPTS`] tries.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::types::{DeliveryStatus, Notification, NotificationKind, MAX_DELIVERY_ATTEMPTS};

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, body, payload_json, status, \
     attempts, last_error, scheduled_at, sent_at, read_at, created_at";

/// Store for user notifications.
pub struct NotificationStore<'a> {
    conn: &'a Connection,
}

impl<'a> NotificationStore<'a> {
    /// Create a new notification store with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Queue a notification. Sets the id on success.
    pub fn insert(&self, notification: &mut Notification) -> Result<(), NotificationError> {
        validate(notification)?;

        let payload_json = notification
            .payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            "INSERT INTO notifications
             (user_id, kind, title, body, payload_json, status, attempts, last_error,
              scheduled_at, sent_at, read_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                notification.user_id,
                notification.kind.as_str(),
                notification.title,
                notification.body,
                payload_json,
                notification.status.as_str(),
                notification.attempts,
                notification.last_error,
                notification.scheduled_at.to_rfc3339(),
                notification.sent_at.map(|t| t.to_rfc3339()),
                notification.read_at.map(|t| t.to_rfc3339()),
                notification.created_at.to_rfc3339(),
            ],
        )?;

        notification.id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    /// Get a notification by id.
    pub fn get(&self, id: i64) -> Result<Option<Notification>, NotificationError> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM notifications WHERE id = ?1",
                    NOTIFICATION_COLUMNS
                ),
                params![id],
                parse_notification_row,
            )
            .optional()
            .map_err(NotificationError::from)
    }

    /// All notifications for a user, newest scheduled first.
    pub fn for_user(&self, user_id: i64) -> Result<Vec<Notification>, NotificationError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM notifications
             WHERE user_id = ?1
             ORDER BY scheduled_at DESC, id DESC",
            NOTIFICATION_COLUMNS
        ))?;

        let rows = stmt.query_map(params![user_id], parse_notification_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(NotificationError::from)
    }

    /// Pending notifications due at or before `now`, oldest first.
    pub fn pending_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, NotificationError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM notifications
             WHERE status = 'pending' AND scheduled_at <= ?1
             ORDER BY scheduled_at ASC, id ASC",
            NOTIFICATION_COLUMNS
        ))?;

        let rows = stmt.query_map(params![now.to_rfc3339()], parse_notification_row)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(NotificationError::from)
    }

    /// Record a successful delivery attempt.
    pub fn record_delivery(&self, id: i64) -> Result<(), NotificationError> {
        let notification = self.get(id)?.ok_or(NotificationError::NotFound(id))?;

        if notification.status != DeliveryStatus::Pending {
            return Err(NotificationError::ValidationError(format!(
                "Only pending notifications can be delivered, this one is {}",
                notification.status
            )));
        }

        self.conn.execute(
            "UPDATE notifications SET status = 'sent', attempts = ?1, sent_at = ?2 WHERE id = ?3",
            params![
                notification.attempts + 1,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;

        Ok(())
    }

    /// Record a failed delivery attempt.
    ///
    /// The notification stays pending for another try until the
    /// attempt cap is reached, then it is marked failed. Returns the
    /// resulting status.
    pub fn record_failure(
        &self,
        id: i64,
        error: &str,
    ) -> Result<DeliveryStatus, NotificationError> {
        let notification = self.get(id)?.ok_or(NotificationError::NotFound(id))?;

        if notification.status != DeliveryStatus::Pending {
            return Err(NotificationError::ValidationError(format!(
                "Only pending notifications can be delivered, this one is {}",
                notification.status
            )));
        }

        let attempts = notification.attempts + 1;
        let status = if attempts >= MAX_DELIVERY_ATTEMPTS {
            DeliveryStatus::Failed
        } else {
            DeliveryStatus::Pending
        };

        self.conn.execute(
            "UPDATE notifications SET attempts = ?1, last_error = ?2, status = ?3 WHERE id = ?4",
            params![attempts, error, status.as_str(), id],
        )?;

        tracing::warn!(
            notification_id = id,
            attempts,
            error,
            "Notification delivery failed"
        );

        Ok(status)
    }

    /// Mark a notification read. Keeps the first read time on repeat
    /// calls.
    pub fn mark_read(&self, id: i64) -> Result<(), NotificationError> {
        let updated = self.conn.execute(
            "UPDATE notifications SET read_at = COALESCE(read_at, ?1) WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;

        if updated == 0 {
            return Err(NotificationError::NotFound(id));
        }

        Ok(())
    }

    /// Mark every delivered, unread notification for a user as read.
    /// Returns how many were marked.
    pub fn mark_all_read(&self, user_id: i64) -> Result<usize, NotificationError> {
        let updated = self.conn.execute(
            "UPDATE notifications SET read_at = ?1
             WHERE user_id = ?2 AND status = 'sent' AND read_at IS NULL",
            params![Utc::now().to_rfc3339(), user_id],
        )?;

        Ok(updated)
    }

    /// Count of delivered notifications the user has not read yet.
    pub fn unread_count(&self, user_id: i64) -> Result<u32, NotificationError> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM notifications
                 WHERE user_id = ?1 AND status = 'sent' AND read_at IS NULL",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(NotificationError::from)
    }

    /// Cancel a pending notification so it is never delivered.
    pub fn cancel(&self, id: i64) -> Result<(), NotificationError> {
        let notification = self.get(id)?.ok_or(NotificationError::NotFound(id))?;

        if notification.status != DeliveryStatus::Pending {
            return Err(NotificationError::ValidationError(format!(
                "Only pending notifications can be cancelled, this one is {}",
                notification.status
            )));
        }

        self.conn.execute(
            "UPDATE notifications SET status = 'cancelled' WHERE id = ?1",
            params![id],
        )?;

        Ok(())
    }

    /// Delete a notification. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, NotificationError> {
        let deleted = self
            .conn
            .execute("DELETE FROM notifications WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Remove resolved notifications created before `cutoff`. Pending
    /// ones are kept whatever their age. Returns how many were
    /// removed.
    pub fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, NotificationError> {
        let deleted = self.conn.execute(
            "DELETE FROM notifications WHERE created_at < ?1 AND status != 'pending'",
            params![cutoff.to_rfc3339()],
        )?;

        Ok(deleted)
    }
}

/// Parse a database row into a Notification.
fn parse_notification_row(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
    let kind_str: String = row.get(2)?;
    let kind = NotificationKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("Unknown notification kind: {}", kind_str).into(),
        )
    })?;

    let payload_json: Option<String> = row.get(5)?;
    let payload = payload_json
        .map(|s| {
            serde_json::from_str(&s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()?;

    let status_str: String = row.get(6)?;
    let status = DeliveryStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("Unknown delivery status: {}", status_str).into(),
        )
    })?;

    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        title: row.get(3)?,
        body: row.get(4)?,
        payload,
        status,
        attempts: row.get(7)?,
        last_error: row.get(8)?,
        scheduled_at: parse_timestamp(row, 9)?,
        sent_at: parse_opt_timestamp(row, 10)?,
        read_at: parse_opt_timestamp(row, 11)?,
        created_at: parse_timestamp(row, 12)?,
    })
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_opt_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    })
    .transpose()
}

fn validate(notification: &Notification) -> Result<(), NotificationError> {
    if notification.user_id <= 0 {
        return Err(NotificationError::ValidationError(
            "User id must be positive".to_string(),
        ));
    }

    if notification.title.trim().is_empty() {
        return Err(NotificationError::ValidationError(
            "Notification title cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Notification storage errors.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Notification not found: {0}")]
    NotFound(i64),
}
