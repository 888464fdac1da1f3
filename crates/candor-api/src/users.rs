use axum::{
    Extension, Json,
    extract::{Path, State},
};

use candor_core::users::validate_password;
use candor_types::api::{Page, ProfileChanges, UpdateProfileRequest};
use candor_types::models::User;

use crate::auth::hash_password;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::{AppState, run_blocking};

pub async fn list_managers(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.list_managers(page)).await?))
}

pub async fn me(Extension(actor): Extension<User>) -> Json<User> {
    Json(actor)
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let password_hash = match &req.password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };
    let changes = ProfileChanges {
        email: req.email,
        full_name: req.full_name,
        password_hash,
    };

    Ok(Json(run_blocking(&state, move |t| t.update_profile(&actor, changes)).await?))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.visible_users(&actor, page)).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.get_user(&actor, user_id)).await?))
}
