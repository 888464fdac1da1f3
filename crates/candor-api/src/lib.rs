//! HTTP surface for the feedback tracker.

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod feedback;
pub mod middleware;
pub mod notifications;
pub mod requests;
pub mod users;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use candor_core::Tracker;
use candor_types::api::Status;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub tracker: Tracker,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

/// Run a tracker operation off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Tracker) -> candor_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let tracker = state.tracker.clone();
    tokio::task::spawn_blocking(move || f(&tracker))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}

async fn ping() -> Json<Status> {
    Json(Status { status: "ok" })
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/ping", get(ping))
        .route("/token", post(auth::login))
        .route("/api/users/", post(auth::register))
        .route("/api/managers/", get(users::list_managers))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/users/", get(users::list_users))
        .route("/api/users/me/", get(users::me).put(users::update_me))
        .route("/api/users/{user_id}", get(users::get_user))
        .route("/api/feedback/", post(feedback::create).get(feedback::list))
        .route("/api/feedback/{feedback_id}", get(feedback::get).put(feedback::update))
        .route("/api/feedback/{feedback_id}/acknowledge", put(feedback::acknowledge))
        .route(
            "/api/feedback/{feedback_id}/comments/",
            post(feedback::add_comment).get(feedback::list_comments),
        )
        .route(
            "/api/feedback/{feedback_id}/tags/",
            get(feedback::feedback_tags).post(feedback::add_tags),
        )
        .route("/api/tags/", get(feedback::visible_tags))
        .route("/api/feedback-requests/", post(requests::create).get(requests::list))
        .route("/api/feedback-requests/{request_id}", get(requests::get))
        .route("/api/notifications/", get(notifications::list))
        .route("/api/notifications/{notification_id}/read", put(notifications::mark_read))
        .route("/api/dashboard/manager", get(dashboard::manager))
        .route("/api/dashboard/employee", get(dashboard::employee))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
