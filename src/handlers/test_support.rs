use crate::core::config::{
    AdminConfig, Config, LogFormat, LoggingConfig, NotifyConfig, RegistryConfig, ServerConfig,
};
use crate::core::state::AppState;
use crate::notify::notifier::Notifier;
use crate::stores::user_store::UserStore;
use axum::body::Body;
use axum::response::Response;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;

pub const TEST_API_KEY: &str = "test-api-key";

pub fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            port: Some(8080),
            unix_socket: None,
            num_threads: 2,
        },
        registry: RegistryConfig {
            max_serial_id: 16,
            wal_path: PathBuf::from("unused.wal"),
        },
        admin: AdminConfig {
            api_key: TEST_API_KEY.to_string(),
        },
        notify: NotifyConfig::default(),
        logging: LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Console,
            console: true,
        },
    }
}

pub fn create_test_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        create_test_config(),
        UserStore::new(),
        Notifier::log_only(),
    ))
}

pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let (_, body) = response.into_parts();
    let bytes = Body::new(body).collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
