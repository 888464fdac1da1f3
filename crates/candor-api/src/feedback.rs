use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use candor_types::api::{FeedbackUpdate, NewComment, NewFeedback, NewTags, Page};
use candor_types::models::{Feedback, FeedbackComment, User};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::{AppState, run_blocking};

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    ApiJson(req): ApiJson<NewFeedback>,
) -> Result<impl IntoResponse, ApiError> {
    let feedback = run_blocking(&state, move |t| t.create_feedback(&actor, req)).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.list_feedback(&actor, page)).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(feedback_id): Path<i64>,
) -> Result<Json<Feedback>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.get_feedback(&actor, feedback_id)).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(feedback_id): Path<i64>,
    ApiJson(changes): ApiJson<FeedbackUpdate>,
) -> Result<Json<Feedback>, ApiError> {
    Ok(Json(
        run_blocking(&state, move |t| t.update_feedback(&actor, feedback_id, changes)).await?,
    ))
}

pub async fn acknowledge(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(feedback_id): Path<i64>,
) -> Result<Json<Feedback>, ApiError> {
    Ok(Json(
        run_blocking(&state, move |t| t.acknowledge_feedback(&actor, feedback_id)).await?,
    ))
}

// -- Comments --

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(feedback_id): Path<i64>,
    ApiJson(req): ApiJson<NewComment>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = run_blocking(&state, move |t| t.add_comment(&actor, feedback_id, req)).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(feedback_id): Path<i64>,
) -> Result<Json<Vec<FeedbackComment>>, ApiError> {
    Ok(Json(
        run_blocking(&state, move |t| t.list_comments(&actor, feedback_id)).await?,
    ))
}

// -- Tags --

pub async fn visible_tags(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.visible_tags(&actor)).await?))
}

pub async fn feedback_tags(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(feedback_id): Path<i64>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(
        run_blocking(&state, move |t| t.feedback_tags(&actor, feedback_id)).await?,
    ))
}

pub async fn add_tags(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(feedback_id): Path<i64>,
    ApiJson(req): ApiJson<NewTags>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(
        run_blocking(&state, move |t| t.add_tags(&actor, feedback_id, &req.tags)).await?,
    ))
}
