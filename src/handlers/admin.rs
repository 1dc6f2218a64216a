use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{
    ActivateResponse, ApiKeyQuery, SuccessResponse, UserListResponse, UserRemoveQuery, UserSummary,
};
use crate::utils::auth::require_api_key;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;

/// Activate every new user that is not active yet
///
/// POST /users/activate?api_key=<key>
pub async fn activate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, ApiError> {
    require_api_key(&params.api_key, &state.config.admin.api_key, "activate")?;

    let activated = state.access.activate_all_pending_new()?;

    info!(activated = activated.len(), "Pending users activated");

    Ok((
        StatusCode::OK,
        Json(ActivateResponse {
            success: true,
            activated: activated.iter().map(|user| user.username.clone()).collect(),
        }),
    )
        .into_response())
}

/// List all users without their PINs
///
/// GET /users?api_key=<key>
pub async fn user_list_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, ApiError> {
    require_api_key(&params.api_key, &state.config.admin.api_key, "user list")?;

    let users: Vec<UserSummary> = state
        .access
        .list_users()
        .iter()
        .map(|user| UserSummary::from(user.as_ref()))
        .collect();

    Ok((
        StatusCode::OK,
        Json(UserListResponse {
            success: true,
            count: users.len(),
            users,
        }),
    )
        .into_response())
}

/// Delete a user, freeing their serial id
///
/// POST /user/remove?api_key=<key>&id=<id>
pub async fn user_remove_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserRemoveQuery>,
) -> Result<Response, ApiError> {
    require_api_key(&params.api_key, &state.config.admin.api_key, "user remove")?;

    let user = state.access.delete_user(params.id)?;

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: format!(
                "User {} removed, serial id {} is free",
                user.username, user.serial_id
            ),
        }),
    )
        .into_response())
}
