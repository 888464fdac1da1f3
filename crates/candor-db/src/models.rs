//! Database row types and column decoding helpers.
//!
//! Rows that carry data the API must never see (the password hash) get their
//! own type here; everything else decodes straight into `candor-types` models.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;

use candor_types::models::{Role, UnknownVariant, User};

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub hashed_password: String,
    pub role: Role,
    pub is_active: bool,
    pub manager_id: Option<i64>,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            role: self.role,
            is_active: self.is_active,
            manager_id: self.manager_id,
        }
    }
}

pub struct NewUserRow<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub hashed_password: &'a str,
    pub role: Role,
    pub manager_id: Option<i64>,
}

/// A feedback row about to be written. Direction is already resolved.
pub struct NewFeedbackRow<'a> {
    pub giver_id: i64,
    pub receiver_id: i64,
    pub content: &'a str,
    pub strengths: &'a str,
    pub areas_to_improve: &'a str,
    pub sentiment: candor_types::models::Sentiment,
    pub is_anonymous: bool,
    pub feedback_request_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i64,
    pub message: String,
    pub related_feedback_id: Option<i64>,
    pub related_request_id: Option<i64>,
}

/// Decode a TEXT column into one of the lowercase enum types.
pub(crate) fn parse_enum<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC, falling back to RFC 3339 for explicit writes.
pub(crate) fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .or_else(|_| raw.parse::<DateTime<Utc>>())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
