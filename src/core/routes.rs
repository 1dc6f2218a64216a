// HTTP routes configuration

use crate::core::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Installation endpoints
        .route("/register", post(crate::handlers::register::register_handler))
        .route("/access", get(crate::handlers::access::access_handler))
        .route("/health", get(crate::handlers::health::health_handler))

        // Admin endpoints (require API key)
        .route("/metrics", get(crate::handlers::metrics::metrics_handler))
        .route("/pins", get(crate::handlers::pins::pin_list_handler))
        .route("/pins/clear", post(crate::handlers::pins::pin_clear_handler))
        .route("/users", get(crate::handlers::admin::user_list_handler))
        .route("/users/activate", post(crate::handlers::admin::activate_handler))
        .route("/user/remove", post(crate::handlers::admin::user_remove_handler))

        // 404 fallback for all unmatched routes
        .fallback(crate::handlers::fallback::fallback_handler)

        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{create_test_state, read_json, TEST_API_KEY};
    use crate::models::api::{ActivateResponse, AccessResponse, PinListResponse, RegisterResponse};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_registration_to_pin_delivery_flow() {
        let state = create_test_state();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/register",
                serde_json::json!({
                    "username": "alice",
                    "pin": "1234",
                    "installation_id": "installation-a"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let registered: RegisterResponse = read_json(response).await;
        assert_eq!(registered.serial_id, 0);

        // Not active yet
        let response = app
            .clone()
            .oneshot(empty_request(Method::GET, "/access?installation_id=installation-a"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(empty_request(
                Method::POST,
                &format!("/users/activate?api_key={}", TEST_API_KEY),
            ))
            .await
            .unwrap();
        let activated: ActivateResponse = read_json(response).await;
        assert_eq!(activated.activated, vec!["alice".to_string()]);

        let response = app
            .clone()
            .oneshot(empty_request(Method::GET, "/access?installation_id=installation-a"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let access: AccessResponse = read_json(response).await;
        assert_eq!(access.username, "alice");

        let response = app
            .clone()
            .oneshot(empty_request(Method::GET, &format!("/pins?api_key={}", TEST_API_KEY)))
            .await
            .unwrap();
        let pins: PinListResponse = read_json(response).await;
        assert_eq!(pins.pins[0].as_deref(), Some("1234"));

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/pins/clear?api_key={}", TEST_API_KEY),
                serde_json::json!({ "serial_ids": [0] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(empty_request(Method::GET, &format!("/pins?api_key={}", TEST_API_KEY)))
            .await
            .unwrap();
        let pins: PinListResponse = read_json(response).await;
        assert!(pins.pins.iter().all(|pin| pin.is_none()));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = build_router(create_test_state());

        let response = app
            .oneshot(empty_request(Method::GET, "/no/such/endpoint"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
