//! Read-only aggregate views.
//!
//! Each aggregate is computed on its own. When one fails it is reported as
//! missing and named in `unavailable`; the rest are still returned.

use std::collections::BTreeMap;

use tracing::warn;

use candor_db::Connection;
use candor_db::feedback::{self as store, Slot};
use candor_db::users;
use candor_types::api::{EmployeeDashboard, ManagerDashboard};
use candor_types::models::{Role, Sentiment, User};

use crate::Tracker;
use crate::authz;
use crate::error::Result;

pub const RECENT_FEEDBACK: u32 = 5;

/// Collects which aggregates could not be computed.
struct Partial {
    unavailable: Vec<&'static str>,
}

impl Partial {
    fn new() -> Self {
        Self {
            unavailable: Vec::new(),
        }
    }

    fn compute<T, F>(&mut self, tracker: &Tracker, name: &'static str, f: F) -> Option<T>
    where
        F: FnOnce(&Connection) -> anyhow::Result<T>,
    {
        match tracker.db.with_conn(f) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(aggregate = name, "dashboard aggregate failed: {e:#}");
                self.unavailable.push(name);
                None
            }
        }
    }
}

fn sentiment_breakdown(conn: &Connection, slot: Slot, user_id: i64) -> anyhow::Result<BTreeMap<Sentiment, i64>> {
    let mut counts: BTreeMap<Sentiment, i64> = Sentiment::ALL.into_iter().map(|s| (s, 0)).collect();
    for (sentiment, n) in store::sentiment_counts(conn, slot, user_id)? {
        counts.insert(sentiment, n);
    }
    Ok(counts)
}

impl Tracker {
    pub fn manager_dashboard(&self, actor: &User) -> Result<ManagerDashboard> {
        authz::require_manager(actor)?;

        let mut partial = Partial::new();
        let employees_count = partial.compute(self, "employees_count", |conn| {
            users::count_employees_of(conn, actor.id)
        });
        let feedback_count = partial.compute(self, "feedback_count", |conn| {
            store::count_feedback(conn, Slot::Giver, actor.id)
        });
        let feedback_by_sentiment = partial.compute(self, "feedback_by_sentiment", |conn| {
            sentiment_breakdown(conn, Slot::Giver, actor.id)
        });
        let recent_feedback = partial.compute(self, "recent_feedback", |conn| {
            store::list_feedback(conn, Slot::Giver, actor.id, 0, RECENT_FEEDBACK)
        });

        Ok(ManagerDashboard {
            feedback_count,
            employees_count,
            feedback_by_sentiment,
            recent_feedback,
            unavailable: partial.unavailable,
        })
    }

    /// Non-employees get an empty dashboard rather than an error.
    pub fn employee_dashboard(&self, actor: &User) -> Result<EmployeeDashboard> {
        if actor.role != Role::Employee {
            return Ok(EmployeeDashboard::empty());
        }

        let mut partial = Partial::new();
        let feedback_count = partial.compute(self, "feedback_count", |conn| {
            store::count_feedback(conn, Slot::Receiver, actor.id)
        });
        let feedback_by_sentiment = partial.compute(self, "feedback_by_sentiment", |conn| {
            sentiment_breakdown(conn, Slot::Receiver, actor.id)
        });
        let recent_feedback = partial.compute(self, "recent_feedback", |conn| {
            store::list_feedback(conn, Slot::Receiver, actor.id, 0, RECENT_FEEDBACK)
        });

        Ok(EmployeeDashboard {
            feedback_count,
            feedback_by_sentiment,
            recent_feedback,
            unavailable: partial.unavailable,
        })
    }
}
