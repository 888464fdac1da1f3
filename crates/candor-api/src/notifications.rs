use axum::{
    Extension, Json,
    extract::{Path, State},
};

use candor_types::api::{Page, Status};
use candor_types::models::{Notification, User};

use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::{AppState, run_blocking};

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.notifications(&actor, page)).await?))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(notification_id): Path<i64>,
) -> Result<Json<Status>, ApiError> {
    run_blocking(&state, move |t| t.mark_notification_read(&actor, notification_id)).await?;
    Ok(Json(Status { status: "success" }))
}
