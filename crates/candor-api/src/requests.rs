use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use candor_types::api::Page;
use candor_types::models::{FeedbackRequest, User};

use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::{AppState, run_blocking};

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let request = run_blocking(&state, move |t| t.create_request(&actor)).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<FeedbackRequest>>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.list_requests(&actor, page)).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(request_id): Path<i64>,
) -> Result<Json<FeedbackRequest>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.get_request(&actor, request_id)).await?))
}
