use crate::core::error::{ApiError, RegistryError};
use crate::core::state::AppState;
use crate::models::api::{RegisterRequest, RegisterResponse};
use crate::services::registration::RegistrationOutcome;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, warn};

/// Register a new installation or update a known one
///
/// POST /register  {"username": ..., "pin": ..., "installation_id": ...}
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let result = state.registration.register_or_update(
        &request.username,
        &request.pin,
        &request.installation_id,
    );

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            state.metrics.increment_rejected();
            match &e {
                RegistryError::CapacityExhausted { .. } | RegistryError::Storage(_) => {
                    error!(error = %e, "Registration failed")
                }
                _ => warn!(error = %e, "Registration rejected"),
            }
            return Err(e.into());
        }
    };

    match &outcome {
        RegistrationOutcome::Created { .. } => state.metrics.increment_created(),
        RegistrationOutcome::Updated { .. } => state.metrics.increment_updated(),
    }

    let user = outcome.user();
    Ok((
        StatusCode::OK,
        Json(RegisterResponse {
            success: true,
            outcome: outcome.label().to_string(),
            username: user.username.clone(),
            serial_id: user.serial_id,
            active: user.active,
        }),
    )
        .into_response())
}
