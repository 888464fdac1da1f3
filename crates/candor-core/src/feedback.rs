use anyhow::anyhow;
use tracing::info;

use candor_db::feedback::{self as store, Slot};
use candor_db::models::{NewFeedbackRow, UserRow};
use candor_db::{Connection, requests, users};
use candor_types::api::{FeedbackUpdate, NewComment, NewFeedback, Page};
use candor_types::events::NotificationEvent;
use candor_types::models::{Feedback, FeedbackComment, Role, User};

use crate::Tracker;
use crate::authz::{self, FeedbackAction};
use crate::direction::resolve_direction;
use crate::error::{CoreError, Result};

pub const MAX_TAG_LEN: usize = 50;

/// Trim, drop blanks and duplicates, keep first-seen order.
fn normalize_tags(tags: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(CoreError::validation(format!(
                "Tag '{tag}' is longer than {MAX_TAG_LEN} characters"
            )));
        }
        out.push(tag.to_string());
    }
    Ok(out)
}

fn load_feedback(conn: &Connection, id: i64) -> Result<Feedback> {
    store::feedback_by_id(conn, id)?.ok_or_else(|| CoreError::not_found("Feedback not found"))
}

/// Load a feedback record and check `action` against it.
fn load_authorized(conn: &Connection, actor: &User, id: i64, action: FeedbackAction) -> Result<Feedback> {
    let feedback = load_feedback(conn, id)?;
    authz::authorize(actor, action, &feedback)?;
    Ok(feedback)
}

/// The listing slot for an actor: managers list what they gave, employees
/// what they received.
fn listing_slot(actor: &User) -> Slot {
    match actor.role {
        Role::Manager => Slot::Giver,
        Role::Employee => Slot::Receiver,
    }
}

impl Tracker {
    /// Submit feedback. The declared target is resolved into canonical
    /// (giver, receiver) slots, a cited request is completed, and the
    /// receiver is notified once everything has committed.
    pub fn create_feedback(&self, actor: &User, req: NewFeedback) -> Result<Feedback> {
        let tags = normalize_tags(&req.tags)?;

        let feedback = self.db.transaction(|tx| {
            let target = match actor.role {
                Role::Manager => users::user_by_id(tx, req.employee_id)?.map(UserRow::into_user),
                Role::Employee => None,
            };
            authz::authorize_create(actor, req.employee_id, target.as_ref())?;
            let direction = resolve_direction(actor, req.employee_id)?;

            // A cited request must be a pending one raised by the receiver.
            if let Some(request_id) = req.feedback_request_id {
                if !requests::complete_pending(tx, request_id, direction.receiver_id)? {
                    return Err(CoreError::not_found(
                        "Feedback request not found or not for this employee",
                    ));
                }
            }

            let id = store::insert_feedback(
                tx,
                &NewFeedbackRow {
                    giver_id: direction.giver_id,
                    receiver_id: direction.receiver_id,
                    content: &req.content,
                    strengths: &req.strengths,
                    areas_to_improve: &req.areas_to_improve,
                    sentiment: req.sentiment,
                    is_anonymous: req.is_anonymous,
                    feedback_request_id: req.feedback_request_id,
                },
            )?;
            store::insert_tags(tx, id, &tags)?;

            store::feedback_by_id(tx, id)?
                .ok_or_else(|| CoreError::from(anyhow!("feedback {id} missing after insert")))
        })?;

        info!(
            feedback = feedback.id,
            giver = feedback.giver_id(),
            receiver = feedback.receiver_id(),
            "feedback created"
        );
        self.dispatcher.dispatch(&NotificationEvent::FeedbackCreated {
            feedback: feedback.clone(),
        });
        Ok(feedback)
    }

    pub fn list_feedback(&self, actor: &User, page: Page) -> Result<Vec<Feedback>> {
        let slot = listing_slot(actor);
        Ok(self.db.with_conn(|conn| {
            store::list_feedback(conn, slot, actor.id, page.skip, page.clamped_limit())
        })?)
    }

    pub fn get_feedback(&self, actor: &User, id: i64) -> Result<Feedback> {
        let feedback = self
            .db
            .with_conn(|conn| Ok(store::feedback_by_id(conn, id)?))?
            .ok_or_else(|| CoreError::not_found("Feedback not found"))?;
        authz::authorize(actor, FeedbackAction::Read, &feedback)?;
        Ok(feedback)
    }

    /// Edit content fields. Giver only.
    pub fn update_feedback(&self, actor: &User, id: i64, changes: FeedbackUpdate) -> Result<Feedback> {
        let feedback = self.db.transaction(|tx| {
            load_authorized(tx, actor, id, FeedbackAction::Update)?;
            store::update_feedback(tx, id, &changes)?;
            load_feedback(tx, id)
        })?;

        info!(feedback = id, actor = actor.id, "feedback updated");
        Ok(feedback)
    }

    /// Mark feedback as acknowledged. Receiver only. The giver is notified
    /// the first time only.
    pub fn acknowledge_feedback(&self, actor: &User, id: i64) -> Result<Feedback> {
        let (feedback, first_time) = self.db.transaction(|tx| {
            let before = load_authorized(tx, actor, id, FeedbackAction::Acknowledge)?;
            store::acknowledge(tx, id)?;
            Ok::<_, CoreError>((load_feedback(tx, id)?, !before.is_acknowledged))
        })?;

        if first_time {
            info!(feedback = id, actor = actor.id, "feedback acknowledged");
            self.dispatcher.dispatch(&NotificationEvent::FeedbackAcknowledged {
                feedback: feedback.clone(),
            });
        }
        Ok(feedback)
    }

    pub fn add_comment(&self, actor: &User, id: i64, req: NewComment) -> Result<FeedbackComment> {
        let text = req.comment.trim();
        if text.is_empty() {
            return Err(CoreError::validation("Comment must not be empty"));
        }

        let (feedback, comment) = self.db.transaction(|tx| {
            let feedback = load_authorized(tx, actor, id, FeedbackAction::Comment)?;
            let comment_id = store::insert_comment(tx, id, actor.id, text)?;
            let comment = store::comment_by_id(tx, comment_id)?
                .ok_or_else(|| anyhow!("comment {comment_id} missing after insert"))?;
            Ok::<_, CoreError>((feedback, comment))
        })?;

        info!(feedback = id, comment = comment.id, author = actor.id, "comment added");
        self.dispatcher.dispatch(&NotificationEvent::CommentAdded {
            feedback,
            comment: comment.clone(),
        });
        Ok(comment)
    }

    pub fn list_comments(&self, actor: &User, id: i64) -> Result<Vec<FeedbackComment>> {
        let feedback = self.get_feedback(actor, id)?;
        Ok(self
            .db
            .with_conn(|conn| store::comments_for(conn, feedback.id))?)
    }

    // -- Tags --

    pub fn feedback_tags(&self, actor: &User, id: i64) -> Result<Vec<String>> {
        Ok(self.get_feedback(actor, id)?.tags)
    }

    /// Attach tags to feedback the actor may edit. Returns the full tag set.
    pub fn add_tags(&self, actor: &User, id: i64, tags: &[String]) -> Result<Vec<String>> {
        let tags = normalize_tags(tags)?;
        self.db.transaction(|tx| {
            load_authorized(tx, actor, id, FeedbackAction::Update)?;
            store::insert_tags(tx, id, &tags)?;
            Ok(store::tags_for(tx, id)?)
        })
    }

    /// Tags on feedback the actor can list, using the same slot as
    /// [`Tracker::list_feedback`].
    pub fn visible_tags(&self, actor: &User) -> Result<Vec<String>> {
        let slot = listing_slot(actor);
        Ok(self
            .db
            .with_conn(|conn| store::tag_names_visible_to(conn, slot, actor.id))?)
    }
}
