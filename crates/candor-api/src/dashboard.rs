use axum::{Extension, Json, extract::State};

use candor_types::api::{EmployeeDashboard, ManagerDashboard};
use candor_types::models::User;

use crate::error::ApiError;
use crate::{AppState, run_blocking};

pub async fn manager(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
) -> Result<Json<ManagerDashboard>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.manager_dashboard(&actor)).await?))
}

pub async fn employee(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
) -> Result<Json<EmployeeDashboard>, ApiError> {
    Ok(Json(run_blocking(&state, move |t| t.employee_dashboard(&actor)).await?))
}
