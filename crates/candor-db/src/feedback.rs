use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, Row, params};

use candor_types::api::FeedbackUpdate;
use candor_types::models::{Feedback, FeedbackComment, Sentiment};

use crate::OptionalExt;
use crate::models::{NewFeedbackRow, parse_enum, parse_timestamp};

const FEEDBACK_COLUMNS: &str = "id, content, strengths, areas_to_improve, sentiment, is_anonymous, \
     is_acknowledged, manager_id, employee_id, feedback_request_id, created_at, updated_at";

/// Which storage slot a listing filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// `manager_id`: the author of the feedback.
    Giver,
    /// `employee_id`: the subject of the feedback.
    Receiver,
}

impl Slot {
    fn column(self) -> &'static str {
        match self {
            Self::Giver => "manager_id",
            Self::Receiver => "employee_id",
        }
    }
}

fn map_feedback(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get(0)?,
        content: row.get(1)?,
        strengths: row.get(2)?,
        areas_to_improve: row.get(3)?,
        sentiment: parse_enum(4, row.get(4)?)?,
        is_anonymous: row.get(5)?,
        is_acknowledged: row.get(6)?,
        manager_id: row.get(7)?,
        employee_id: row.get(8)?,
        feedback_request_id: row.get(9)?,
        tags: Vec::new(),
        created_at: parse_timestamp(10, row.get(10)?)?,
        updated_at: parse_timestamp(11, row.get(11)?)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<FeedbackComment> {
    Ok(FeedbackComment {
        id: row.get(0)?,
        feedback_id: row.get(1)?,
        author_id: row.get(2)?,
        comment: row.get(3)?,
        created_at: parse_timestamp(4, row.get(4)?)?,
    })
}

pub fn insert_feedback(conn: &Connection, fb: &NewFeedbackRow<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO feedback
            (content, strengths, areas_to_improve, sentiment, is_anonymous,
             manager_id, employee_id, feedback_request_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            fb.content,
            fb.strengths,
            fb.areas_to_improve,
            fb.sentiment.as_str(),
            fb.is_anonymous,
            fb.giver_id,
            fb.receiver_id,
            fb.feedback_request_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Attach tag names to a feedback record. Names already present are skipped.
pub fn insert_tags(conn: &Connection, feedback_id: i64, tags: &[String]) -> Result<()> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO feedback_tags (feedback_id, tag_name) VALUES (?1, ?2)")?;
    for tag in tags {
        stmt.execute(params![feedback_id, tag])?;
    }
    Ok(())
}

pub fn feedback_by_id(conn: &Connection, id: i64) -> Result<Option<Feedback>> {
    let found = conn
        .query_row(
            &format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ?1"),
            [id],
            map_feedback,
        )
        .optional()?;

    match found {
        Some(fb) => {
            let mut list = [fb];
            attach_tags(conn, &mut list)?;
            let [fb] = list;
            Ok(Some(fb))
        }
        None => Ok(None),
    }
}

/// Feedback where `user_id` occupies `slot`, newest first.
pub fn list_feedback(
    conn: &Connection,
    slot: Slot,
    user_id: i64,
    skip: u32,
    limit: u32,
) -> Result<Vec<Feedback>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback
         WHERE {} = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2 OFFSET ?3",
        slot.column()
    ))?;

    let mut rows = stmt
        .query_map(params![user_id, limit, skip], map_feedback)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    attach_tags(conn, &mut rows)?;
    Ok(rows)
}

pub fn count_feedback(conn: &Connection, slot: Slot, user_id: i64) -> Result<i64> {
    Ok(conn.query_row(
        &format!("SELECT COUNT(*) FROM feedback WHERE {} = ?1", slot.column()),
        [user_id],
        |row| row.get(0),
    )?)
}

pub fn sentiment_counts(conn: &Connection, slot: Slot, user_id: i64) -> Result<Vec<(Sentiment, i64)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT sentiment, COUNT(id) FROM feedback WHERE {} = ?1 GROUP BY sentiment",
        slot.column()
    ))?;

    let rows = stmt
        .query_map([user_id], |row| Ok((parse_enum(0, row.get(0)?)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Apply the set fields of `changes`. Returns false when no row matched.
pub fn update_feedback(conn: &Connection, id: i64, changes: &FeedbackUpdate) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE feedback SET
            content = COALESCE(?2, content),
            strengths = COALESCE(?3, strengths),
            areas_to_improve = COALESCE(?4, areas_to_improve),
            sentiment = COALESCE(?5, sentiment),
            updated_at = datetime('now')
         WHERE id = ?1",
        params![
            id,
            changes.content,
            changes.strengths,
            changes.areas_to_improve,
            changes.sentiment.map(|s| s.as_str())
        ],
    )?;
    Ok(updated == 1)
}

pub fn acknowledge(conn: &Connection, id: i64) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE feedback SET is_acknowledged = 1, updated_at = datetime('now') WHERE id = ?1",
        [id],
    )?;
    Ok(updated == 1)
}

// -- Tags --

pub fn tags_for(conn: &Connection, feedback_id: i64) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT tag_name FROM feedback_tags WHERE feedback_id = ?1 ORDER BY tag_name")?;
    let tags = stmt
        .query_map([feedback_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(tags)
}

/// Distinct tag names on feedback where `user_id` occupies `slot`.
pub fn tag_names_visible_to(conn: &Connection, slot: Slot, user_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT t.tag_name
         FROM feedback_tags t
         JOIN feedback f ON f.id = t.feedback_id
         WHERE f.{} = ?1
         ORDER BY t.tag_name",
        slot.column()
    ))?;
    let tags = stmt
        .query_map([user_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(tags)
}

/// Batch-fetch tags for a set of feedback rows in one query.
fn attach_tags(conn: &Connection, rows: &mut [Feedback]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let placeholders: Vec<String> = (1..=rows.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT feedback_id, tag_name FROM feedback_tags WHERE feedback_id IN ({}) ORDER BY tag_name",
        placeholders.join(", ")
    );

    let ids: Vec<i64> = rows.iter().map(|fb| fb.id).collect();
    let mut stmt = conn.prepare(&sql)?;
    let pairs = stmt
        .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut by_feedback: HashMap<i64, Vec<String>> = HashMap::new();
    for (feedback_id, tag) in pairs {
        by_feedback.entry(feedback_id).or_default().push(tag);
    }

    for fb in rows.iter_mut() {
        fb.tags = by_feedback.remove(&fb.id).unwrap_or_default();
    }
    Ok(())
}

// -- Comments --

pub fn insert_comment(conn: &Connection, feedback_id: i64, author_id: i64, comment: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO feedback_comments (feedback_id, author_id, comment) VALUES (?1, ?2, ?3)",
        params![feedback_id, author_id, comment],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn comment_by_id(conn: &Connection, id: i64) -> Result<Option<FeedbackComment>> {
    conn.query_row(
        "SELECT id, feedback_id, author_id, comment, created_at FROM feedback_comments WHERE id = ?1",
        [id],
        map_comment,
    )
    .optional()
}

pub fn comments_for(conn: &Connection, feedback_id: i64) -> Result<Vec<FeedbackComment>> {
    let mut stmt = conn.prepare(
        "SELECT id, feedback_id, author_id, comment, created_at
         FROM feedback_comments
         WHERE feedback_id = ?1
         ORDER BY created_at, id",
    )?;
    let rows = stmt
        .query_map([feedback_id], map_comment)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::users::tests::add_user;
    use candor_types::models::Role;

    fn sample(giver_id: i64, receiver_id: i64, sentiment: Sentiment) -> NewFeedbackRow<'static> {
        NewFeedbackRow {
            giver_id,
            receiver_id,
            content: "Solid quarter",
            strengths: "Ownership",
            areas_to_improve: "Delegation",
            sentiment,
            is_anonymous: false,
            feedback_request_id: None,
        }
    }

    #[test]
    fn tags_are_loaded_with_feedback() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let m = add_user(conn, "m@x.io", Role::Manager, None);
            let e = add_user(conn, "e@x.io", Role::Employee, Some(m));
            let id = insert_feedback(conn, &sample(m, e, Sentiment::Positive))?;
            insert_tags(conn, id, &["teamwork".to_string(), "growth".to_string(), "growth".to_string()])?;

            let fb = feedback_by_id(conn, id)?.unwrap();
            assert_eq!(fb.tags, vec!["growth", "teamwork"]);
            assert!(!fb.is_acknowledged);

            let listed = list_feedback(conn, Slot::Receiver, e, 0, 10)?;
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0].tags.len(), 2);
            assert!(list_feedback(conn, Slot::Giver, e, 0, 10)?.is_empty());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn sentiment_counts_group_by_slot() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let m = add_user(conn, "m@x.io", Role::Manager, None);
            let e = add_user(conn, "e@x.io", Role::Employee, Some(m));
            insert_feedback(conn, &sample(m, e, Sentiment::Positive))?;
            insert_feedback(conn, &sample(m, e, Sentiment::Positive))?;
            insert_feedback(conn, &sample(m, e, Sentiment::Negative))?;

            let mut counts = sentiment_counts(conn, Slot::Giver, m)?;
            counts.sort();
            assert_eq!(counts, vec![(Sentiment::Positive, 2), (Sentiment::Negative, 1)]);
            assert_eq!(count_feedback(conn, Slot::Receiver, e)?, 3);
            assert_eq!(count_feedback(conn, Slot::Receiver, m)?, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn partial_update_leaves_other_fields() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let m = add_user(conn, "m@x.io", Role::Manager, None);
            let e = add_user(conn, "e@x.io", Role::Employee, Some(m));
            let id = insert_feedback(conn, &sample(m, e, Sentiment::Neutral))?;

            let changed = update_feedback(
                conn,
                id,
                &FeedbackUpdate {
                    sentiment: Some(Sentiment::Positive),
                    ..Default::default()
                },
            )?;
            assert!(changed);
            assert!(!update_feedback(conn, id + 100, &FeedbackUpdate::default())?);

            let fb = feedback_by_id(conn, id)?.unwrap();
            assert_eq!(fb.sentiment, Sentiment::Positive);
            assert_eq!(fb.content, "Solid quarter");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn comments_cascade_with_feedback() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let m = add_user(conn, "m@x.io", Role::Manager, None);
            let e = add_user(conn, "e@x.io", Role::Employee, Some(m));
            let id = insert_feedback(conn, &sample(m, e, Sentiment::Neutral))?;
            insert_comment(conn, id, e, "Thanks")?;
            insert_tags(conn, id, &["q3".to_string()])?;

            conn.execute("DELETE FROM feedback WHERE id = ?1", [id])?;
            assert!(comments_for(conn, id)?.is_empty());
            assert!(tags_for(conn, id)?.is_empty());
            Ok(())
        })
        .unwrap();
    }
}
