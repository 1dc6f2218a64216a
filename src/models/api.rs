use crate::models::user::User;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub pin: String,
    pub installation_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    /// "created" or "updated"
    pub outcome: String,
    pub username: String,
    pub serial_id: usize,
    pub active: bool,
}

#[derive(Deserialize)]
pub struct AccessQuery {
    pub installation_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessResponse {
    pub success: bool,
    pub username: String,
    pub serial_id: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PinListResponse {
    pub success: bool,
    /// Indexed by serial id
    pub pins: Vec<Option<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ClearPinsRequest {
    pub serial_ids: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearPinsResponse {
    pub success: bool,
    pub cleared: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivateResponse {
    pub success: bool,
    pub activated: Vec<String>,
}

#[derive(Deserialize)]
pub struct UserRemoveQuery {
    pub api_key: String,
    pub id: u64,
}

/// Admin view of a user; the PIN itself is never exposed
#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub installation_id: String,
    pub username: String,
    pub serial_id: usize,
    pub active: bool,
    pub is_new_user: bool,
    pub has_pin: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            installation_id: user.installation_id.clone(),
            username: user.username.clone(),
            serial_id: user.serial_id,
            active: user.active,
            is_new_user: user.is_new_user,
            has_pin: user.pin.is_some(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub success: bool,
    pub count: usize,
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
