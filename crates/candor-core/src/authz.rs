//! Authorization rules.
//!
//! Every check here is a pure decision over records the caller has already
//! fetched. Nothing in this module touches the store.

use tracing::debug;

use candor_types::models::{Feedback, FeedbackRequest, Role, User};

use crate::error::{CoreError, Result};

/// What an actor wants to do with an existing feedback record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackAction {
    Read,
    Update,
    Acknowledge,
    Comment,
}

impl FeedbackAction {
    fn denial(self) -> &'static str {
        match self {
            Self::Read => "Not authorized to access this feedback",
            Self::Update => "Not authorized to modify this feedback",
            Self::Acknowledge => "Not authorized to acknowledge this feedback",
            Self::Comment => "Not authorized to comment on this feedback",
        }
    }
}

/// Membership as seen from the actor's role: employees look at the receiver
/// slot, managers at the giver slot.
fn is_member(actor: &User, feedback: &Feedback) -> bool {
    match actor.role {
        Role::Employee => feedback.employee_id == actor.id,
        Role::Manager => feedback.manager_id == actor.id,
    }
}

pub fn authorize(actor: &User, action: FeedbackAction, feedback: &Feedback) -> Result<()> {
    let allowed = match action {
        FeedbackAction::Read | FeedbackAction::Comment => is_member(actor, feedback),
        FeedbackAction::Update => actor.role == Role::Manager && feedback.manager_id == actor.id,
        // Receiver slot only, whatever role sits in it.
        FeedbackAction::Acknowledge => feedback.employee_id == actor.id,
    };

    if allowed {
        Ok(())
    } else {
        debug!(actor = actor.id, feedback = feedback.id, ?action, "feedback access denied");
        Err(CoreError::forbidden(action.denial()))
    }
}

/// May `actor` submit feedback addressed to `declared_target_id`?
///
/// `target` is the looked-up record for the declared id, if it exists. Only
/// the manager branch needs it.
pub fn authorize_create(actor: &User, declared_target_id: i64, target: Option<&User>) -> Result<()> {
    match actor.role {
        Role::Manager => {
            let managed = target.is_some_and(|t| t.manager_id == Some(actor.id));
            if !managed {
                debug!(actor = actor.id, target = declared_target_id, "create denied: not a report");
                return Err(CoreError::forbidden(format!(
                    "Employee with ID {declared_target_id} not managed by you"
                )));
            }
        }
        Role::Employee => {
            if actor.manager_id != Some(declared_target_id) {
                debug!(actor = actor.id, target = declared_target_id, "create denied: not own manager");
                return Err(CoreError::forbidden(
                    "Employees can only submit feedback to their manager",
                ));
            }
        }
    }
    Ok(())
}

/// Employee-of-manager check for manager-scoped operations.
pub fn ensure_manages(actor: &User, employee: &User) -> Result<()> {
    if actor.role == Role::Manager && employee.manager_id == Some(actor.id) {
        Ok(())
    } else {
        Err(CoreError::forbidden(format!(
            "User with ID {} not managed by you",
            employee.id
        )))
    }
}

/// Managers see themselves and their reports. Employees see themselves,
/// their manager, and anyone who has given them feedback.
pub fn can_view_user(actor: &User, target: &User, target_gave_feedback: bool) -> bool {
    if actor.id == target.id {
        return true;
    }
    match actor.role {
        Role::Manager => target.manager_id == Some(actor.id),
        Role::Employee => actor.manager_id == Some(target.id) || target_gave_feedback,
    }
}

pub fn authorize_user_view(actor: &User, target: &User, target_gave_feedback: bool) -> Result<()> {
    if can_view_user(actor, target, target_gave_feedback) {
        Ok(())
    } else {
        Err(CoreError::forbidden("Not authorized to access this user's data"))
    }
}

/// Requests are visible to the requester and to the requester's manager.
pub fn authorize_request_view(actor: &User, request: &FeedbackRequest, requester: &User) -> Result<()> {
    if request.employee_id == actor.id || ensure_manages(actor, requester).is_ok() {
        Ok(())
    } else {
        Err(CoreError::forbidden("Not authorized to access this feedback request"))
    }
}

pub fn require_manager(actor: &User) -> Result<()> {
    if actor.role == Role::Manager {
        Ok(())
    } else {
        Err(CoreError::forbidden("Not authorized. Manager role required."))
    }
}
