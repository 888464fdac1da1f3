use anyhow::anyhow;
use tracing::info;

use candor_db::models::UserRow;
use candor_db::{requests, users};
use candor_types::api::Page;
use candor_types::events::NotificationEvent;
use candor_types::models::{FeedbackRequest, Role, User};

use crate::Tracker;
use crate::authz;
use crate::error::{CoreError, Result};

impl Tracker {
    /// Ask for feedback. The actor's manager, if any, is notified.
    pub fn create_request(&self, actor: &User) -> Result<FeedbackRequest> {
        let request = self.db.transaction(|tx| {
            let id = requests::insert_request(tx, actor.id)?;
            requests::request_by_id(tx, id)?
                .ok_or_else(|| CoreError::from(anyhow!("request {id} missing after insert")))
        })?;

        info!(request = request.id, requester = actor.id, "feedback requested");
        self.dispatcher.dispatch(&NotificationEvent::FeedbackRequested {
            request: request.clone(),
        });
        Ok(request)
    }

    /// Employees see their own requests; managers see their reports'.
    pub fn list_requests(&self, actor: &User, page: Page) -> Result<Vec<FeedbackRequest>> {
        let limit = page.clamped_limit();
        Ok(self.db.with_conn(|conn| match actor.role {
            Role::Employee => requests::requests_by_employee(conn, actor.id, page.skip, limit),
            Role::Manager => requests::requests_for_manager(conn, actor.id, page.skip, limit),
        })?)
    }

    pub fn get_request(&self, actor: &User, id: i64) -> Result<FeedbackRequest> {
        let (request, requester) = self.db.with_conn(|conn| {
            let Some(request) = requests::request_by_id(conn, id)? else {
                return Ok(None);
            };
            let requester = users::user_by_id(conn, request.employee_id)?
                .map(UserRow::into_user)
                .ok_or_else(|| anyhow!("requester {} missing", request.employee_id))?;
            Ok(Some((request, requester)))
        })?
        .ok_or_else(|| CoreError::not_found("Feedback request not found"))?;

        authz::authorize_request_view(actor, &request, &requester)?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candor_types::models::RequestStatus;

    use crate::testing::org;

    #[test]
    fn request_is_visible_to_requester_and_their_manager() {
        let org = org();
        let t = &org.tracker;

        let req = t.create_request(&org.employee).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.employee_id, org.employee.id);

        assert!(t.get_request(&org.employee, req.id).is_ok());
        assert!(t.get_request(&org.manager, req.id).is_ok());
        assert!(matches!(t.get_request(&org.peer, req.id), Err(CoreError::Forbidden(_))));
        assert!(matches!(t.get_request(&org.other_manager, req.id), Err(CoreError::Forbidden(_))));
        assert!(matches!(t.get_request(&org.manager, 404), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn listing_is_scoped_by_role() {
        let org = org();
        let t = &org.tracker;
        t.create_request(&org.employee).unwrap();
        t.create_request(&org.peer).unwrap();
        t.create_request(&org.outsider).unwrap();

        assert_eq!(t.list_requests(&org.manager, Page::default()).unwrap().len(), 2);
        assert_eq!(t.list_requests(&org.employee, Page::default()).unwrap().len(), 1);
        assert_eq!(t.list_requests(&org.other_manager, Page::default()).unwrap().len(), 1);
    }

    #[test]
    fn manager_is_notified_of_request() {
        let org = org();
        let t = &org.tracker;
        t.create_request(&org.employee).unwrap();

        let inbox = t.notifications(&org.manager, Page::default()).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].message, "Eli Employee has requested feedback");
        assert!(inbox[0].related_request_id.is_some());
    }
}
