// Metrics endpoint

use crate::core::error::MonitoringError;
use crate::core::state::AppState;
use crate::models::api::ApiKeyQuery;
use crate::utils::auth::keys_match;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::warn;

/// Registration and access counters plus slot usage.
///
/// Requires valid API key for authentication.
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, MonitoringError> {
    if !keys_match(&params.api_key, &state.config.admin.api_key) {
        warn!("Unauthorized metrics access attempt");
        return Err(MonitoringError::InvalidApiKey);
    }

    let snapshot = state.metrics.get_snapshot(&state.store, state.capacity());

    Ok((StatusCode::OK, Json(snapshot)).into_response())
}
