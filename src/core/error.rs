// Centralized error handling for the registry

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

/// Input that does not meet the registration field constraints
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must be at least {min} characters, got {actual}")]
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("{field} must be exactly {expected} characters, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Failures of the user store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("serial id {serial_id} is already held by user {holder}")]
    SerialIdConflict { serial_id: usize, holder: u64 },

    #[error("installation id is already held by user {holder}")]
    InstallationIdConflict { holder: u64 },

    #[error("failed to persist change: {0}")]
    Persistence(#[from] anyhow::Error),
}

/// Errors surfaced by the registration and access operations
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Username {0} already exists")]
    DuplicateUsername(String),

    #[error("Too many users: all {capacity} serial ids are in use")]
    CapacityExhausted { capacity: usize },

    #[error("User with serial id {serial_id} does not exist")]
    RecordNotFound { serial_id: usize },

    #[error("User {id} does not exist")]
    UnknownUser { id: u64 },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Errors returned by the HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Access denied")]
    AccessDenied,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ApiError::AccessDenied => StatusCode::FORBIDDEN,
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Registry(err) => match err {
                RegistryError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
                RegistryError::DuplicateUsername(_) => StatusCode::CONFLICT,
                RegistryError::CapacityExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
                RegistryError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
                RegistryError::UnknownUser { .. } => StatusCode::NOT_FOUND,
                RegistryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use crate::models::api::ErrorResponse;

        let status = self.status();

        // Storage details stay in the logs
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Invalid API key")]
    InvalidApiKey,
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MonitoringError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        };

        (status, message).into_response()
    }
}
