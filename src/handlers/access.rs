use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{AccessQuery, AccessResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Access-control check for an installation
///
/// GET /access?installation_id=<id>
///
/// Unknown and inactive installations get the same 403.
pub async fn access_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AccessQuery>,
) -> Result<Response, ApiError> {
    let Some(user) = state.access.get_active_user(&params.installation_id) else {
        state.metrics.increment_access_denied();
        info!("Access denied for unknown or inactive installation");
        return Err(ApiError::AccessDenied);
    };

    state.metrics.increment_access_granted();
    debug!(user_id = user.id, serial_id = user.serial_id, "Access granted");

    Ok((
        StatusCode::OK,
        Json(AccessResponse {
            success: true,
            username: user.username.clone(),
            serial_id: user.serial_id,
        }),
    )
        .into_response())
}
