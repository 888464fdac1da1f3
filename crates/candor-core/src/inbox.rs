use candor_db::notifications;
use candor_types::api::Page;
use candor_types::models::{Notification, User};

use crate::Tracker;
use crate::error::{CoreError, Result};

impl Tracker {
    pub fn notifications(&self, actor: &User, page: Page) -> Result<Vec<Notification>> {
        Ok(self.db.with_conn(|conn| {
            notifications::notifications_for(conn, actor.id, page.skip, page.clamped_limit())
        })?)
    }

    /// Someone else's notification is reported as absent.
    pub fn mark_notification_read(&self, actor: &User, id: i64) -> Result<()> {
        let marked = self
            .db
            .with_conn(|conn| notifications::mark_read(conn, id, actor.id))?;
        if marked {
            Ok(())
        } else {
            Err(CoreError::not_found("Notification not found"))
        }
    }
}
