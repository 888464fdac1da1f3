use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, warn};

use candor_db::models::NewNotification;
use candor_db::{Connection, Database, notifications, users};
use candor_types::events::NotificationEvent;
use candor_types::models::Feedback;

/// Writes notifications for committed state transitions.
///
/// Delivery is best-effort: a failure is logged and dropped, never returned
/// to the operation that raised the event.
#[derive(Clone)]
pub struct Dispatcher {
    db: Arc<Database>,
}

impl Dispatcher {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Returns true when a notification was written.
    pub fn dispatch(&self, event: &NotificationEvent) -> bool {
        match self.db.with_conn(|conn| deliver(conn, event)) {
            Ok(Some(id)) => {
                debug!(kind = event.kind(), notification = id, "notification written");
                true
            }
            Ok(None) => {
                debug!(kind = event.kind(), "no recipient for notification");
                false
            }
            Err(e) => {
                warn!(kind = event.kind(), "notification dispatch failed: {e:#}");
                false
            }
        }
    }
}

fn deliver(conn: &Connection, event: &NotificationEvent) -> Result<Option<i64>> {
    match compose(conn, event)? {
        Some(notice) => notifications::insert_notification(conn, &notice).map(Some),
        None => Ok(None),
    }
}

/// The party on `feedback` that did not write the comment.
pub fn other_party(feedback: &Feedback, author_id: i64) -> i64 {
    if author_id == feedback.giver_id() {
        feedback.receiver_id()
    } else {
        feedback.giver_id()
    }
}

fn full_name(conn: &Connection, id: i64) -> Result<String> {
    users::user_by_id(conn, id)?
        .map(|u| u.full_name)
        .ok_or_else(|| anyhow!("user {id} not found"))
}

fn compose(conn: &Connection, event: &NotificationEvent) -> Result<Option<NewNotification>> {
    let notice = match event {
        NotificationEvent::FeedbackCreated { feedback } => Some(NewNotification {
            user_id: feedback.receiver_id(),
            message: format!(
                "You have received new feedback from {}",
                full_name(conn, feedback.giver_id())?
            ),
            related_feedback_id: Some(feedback.id),
            related_request_id: None,
        }),
        NotificationEvent::FeedbackAcknowledged { feedback } => Some(NewNotification {
            user_id: feedback.giver_id(),
            message: format!(
                "{} has acknowledged your feedback",
                full_name(conn, feedback.receiver_id())?
            ),
            related_feedback_id: Some(feedback.id),
            related_request_id: None,
        }),
        NotificationEvent::FeedbackRequested { request } => {
            let requester = users::user_by_id(conn, request.employee_id)?
                .ok_or_else(|| anyhow!("requester {} not found", request.employee_id))?;
            requester.manager_id.map(|manager_id| NewNotification {
                user_id: manager_id,
                message: format!("{} has requested feedback", requester.full_name),
                related_feedback_id: None,
                related_request_id: Some(request.id),
            })
        }
        NotificationEvent::CommentAdded { feedback, comment } => Some(NewNotification {
            user_id: other_party(feedback, comment.author_id),
            message: format!("{} commented on feedback", full_name(conn, comment.author_id)?),
            related_feedback_id: Some(feedback.id),
            related_request_id: None,
        }),
    };
    Ok(notice)
}
