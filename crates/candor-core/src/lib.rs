//! Authorization, direction resolution and notification fan-out for the
//! feedback tracker, plus the transactional operations that combine them.
//!
//! Every operation takes an already-authenticated actor. Writes run in one
//! store transaction; notifications are dispatched only after it commits.

pub mod authz;
pub mod dashboard;
pub mod direction;
pub mod error;
pub mod feedback;
pub mod inbox;
pub mod notify;
pub mod requests;
pub mod users;

use std::sync::Arc;

use candor_db::Database;

pub use error::{CoreError, Result};
pub use notify::Dispatcher;

/// Entry point for every tracker operation. Cheap to clone.
#[derive(Clone)]
pub struct Tracker {
    db: Arc<Database>,
    dispatcher: Dispatcher,
}

impl Tracker {
    pub fn new(db: Arc<Database>) -> Self {
        let dispatcher = Dispatcher::new(db.clone());
        Self { db, dispatcher }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}
