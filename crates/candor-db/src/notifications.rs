use anyhow::Result;
use rusqlite::{Connection, Row, params};

use candor_types::models::Notification;

use crate::models::{NewNotification, parse_timestamp};

fn map_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        read: row.get(3)?,
        related_feedback_id: row.get(4)?,
        related_request_id: row.get(5)?,
        created_at: parse_timestamp(6, row.get(6)?)?,
    })
}

pub fn insert_notification(conn: &Connection, n: &NewNotification) -> Result<i64> {
    conn.execute(
        "INSERT INTO notifications (user_id, message, related_feedback_id, related_request_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![n.user_id, n.message, n.related_feedback_id, n.related_request_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Notifications addressed to `user_id`, newest first.
pub fn notifications_for(conn: &Connection, user_id: i64, skip: u32, limit: u32) -> Result<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, message, read, related_feedback_id, related_request_id, created_at
         FROM notifications
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(params![user_id, limit, skip], map_notification)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Flip `read` on a notification owned by `user_id`. Returns false when no
/// such notification exists for that owner.
pub fn mark_read(conn: &Connection, id: i64, user_id: i64) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2",
        [id, user_id],
    )?;
    Ok(updated == 1)
}
