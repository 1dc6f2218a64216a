use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{ApiKeyQuery, ClearPinsRequest, ClearPinsResponse, PinListResponse};
use crate::utils::auth::require_api_key;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;

/// PINs of active users awaiting delivery to the door controller, indexed by serial id
///
/// GET /pins?api_key=<key>
pub async fn pin_list_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, ApiError> {
    require_api_key(&params.api_key, &state.config.admin.api_key, "pin list")?;

    let pins = state.access.list_active_pins();

    Ok((
        StatusCode::OK,
        Json(PinListResponse {
            success: true,
            pins,
        }),
    )
        .into_response())
}

/// Clear PINs the controller has confirmed
///
/// POST /pins/clear?api_key=<key>  {"serial_ids": [..]}
pub async fn pin_clear_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
    Json(request): Json<ClearPinsRequest>,
) -> Result<Response, ApiError> {
    require_api_key(&params.api_key, &state.config.admin.api_key, "pin clear")?;

    let cleared = state.access.clear_pins(&request.serial_ids)?;

    info!(serial_ids = ?request.serial_ids, "Delivered pins cleared");

    Ok((
        StatusCode::OK,
        Json(ClearPinsResponse {
            success: true,
            cleared: cleared.len(),
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{create_test_state, read_json, TEST_API_KEY};
    use crate::models::user::User;

    fn key(api_key: &str) -> Query<ApiKeyQuery> {
        Query(ApiKeyQuery {
            api_key: api_key.to_string(),
        })
    }

    fn seed(state: &AppState) {
        let mut active = User::new(state.store.next_id(), "installation-a", "almost active", "1234", 3);
        active.active = true;
        state.store.save(active).unwrap();
        state
            .store
            .save(User::new(state.store.next_id(), "installation-b", "inactive", "5678", 5))
            .unwrap();
    }

    #[tokio::test]
    async fn test_pin_list() {
        let state = create_test_state();
        seed(&state);

        let response = pin_list_handler(State(state.clone()), key(TEST_API_KEY)).await.unwrap();
        let body: PinListResponse = read_json(response).await;

        assert_eq!(body.pins.len(), 16);
        assert_eq!(body.pins[3].as_deref(), Some("1234"));
        assert_eq!(body.pins[5], None);
        assert_eq!(body.pins.iter().filter(|pin| pin.is_some()).count(), 1);
    }

    #[tokio::test]
    async fn test_pin_list_requires_api_key() {
        let state = create_test_state();

        let result = pin_list_handler(State(state), key("wrong-key")).await;
        assert_eq!(result.unwrap_err().into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_pin_clear() {
        let state = create_test_state();
        seed(&state);

        let response = pin_clear_handler(
            State(state.clone()),
            key(TEST_API_KEY),
            Json(ClearPinsRequest { serial_ids: vec![3] }),
        )
        .await
        .unwrap();
        let body: ClearPinsResponse = read_json(response).await;
        assert_eq!(body.cleared, 1);

        assert!(state.access.list_active_pins().iter().all(|pin| pin.is_none()));
    }

    #[tokio::test]
    async fn test_pin_clear_unknown_slot() {
        let state = create_test_state();
        seed(&state);

        let result = pin_clear_handler(
            State(state.clone()),
            key(TEST_API_KEY),
            Json(ClearPinsRequest {
                serial_ids: vec![3, 9],
            }),
        )
        .await;
        assert_eq!(result.unwrap_err().into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(state.access.list_active_pins()[3].as_deref(), Some("1234"));
    }
}
