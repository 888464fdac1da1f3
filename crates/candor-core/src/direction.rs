use candor_types::models::{Role, User};

use crate::error::{CoreError, Result};

/// Canonical storage slots for a feedback record. `giver_id` goes into the
/// `manager_id` column and `receiver_id` into `employee_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    pub giver_id: i64,
    pub receiver_id: i64,
}

/// Map the submitter and their declared target onto (giver, receiver).
///
/// A manager gives to the declared target. An employee may only address
/// their own manager, in which case the employee takes the giver slot and
/// the manager the receiver slot.
pub fn resolve_direction(actor: &User, declared_target_id: i64) -> Result<Direction> {
    match actor.role {
        Role::Manager => Ok(Direction {
            giver_id: actor.id,
            receiver_id: declared_target_id,
        }),
        Role::Employee => match actor.manager_id {
            Some(manager_id) if manager_id == declared_target_id => Ok(Direction {
                giver_id: actor.id,
                receiver_id: manager_id,
            }),
            _ => Err(CoreError::forbidden(
                "Employees can only submit feedback to their manager",
            )),
        },
    }
}
