use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Feedback, Role, Sentiment};

// -- JWT Claims --

/// Bearer token claims. The subject is the account email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub nbf: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub manager_id: Option<i64>,
}

/// OAuth2 password-flow form; `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
}

/// Profile changes after the password has been hashed.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
}

// -- Feedback --

/// Submission body. `employee_id` is the declared target; the stored
/// direction is resolved from the submitter's role.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewFeedback {
    pub employee_id: i64,
    pub content: String,
    pub strengths: String,
    pub areas_to_improve: String,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub feedback_request_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedbackUpdate {
    pub content: Option<String>,
    pub strengths: Option<String>,
    pub areas_to_improve: Option<String>,
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewComment {
    pub comment: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTags {
    pub tags: Vec<String>,
}

// -- Pagination --

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

pub const MAX_PAGE_LIMIT: u32 = 200;

fn default_limit() -> u32 {
    100
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl Page {
    pub fn clamped_limit(&self) -> u32 {
        self.limit.min(MAX_PAGE_LIMIT)
    }
}

// -- Dashboards --

/// Aggregates are computed independently. A failed aggregate is `None` and
/// its name is listed in `unavailable`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManagerDashboard {
    pub feedback_count: Option<i64>,
    pub employees_count: Option<i64>,
    pub feedback_by_sentiment: Option<BTreeMap<Sentiment, i64>>,
    pub recent_feedback: Option<Vec<Feedback>>,
    pub unavailable: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmployeeDashboard {
    pub feedback_count: Option<i64>,
    pub feedback_by_sentiment: Option<BTreeMap<Sentiment, i64>>,
    pub recent_feedback: Option<Vec<Feedback>>,
    pub unavailable: Vec<&'static str>,
}

impl EmployeeDashboard {
    pub fn empty() -> Self {
        Self {
            feedback_count: Some(0),
            feedback_by_sentiment: Some(Sentiment::ALL.into_iter().map(|s| (s, 0)).collect()),
            recent_feedback: Some(Vec::new()),
            unavailable: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Status {
    pub status: &'static str,
}
