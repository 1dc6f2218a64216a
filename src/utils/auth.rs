use crate::core::error::ApiError;
use tracing::warn;

/// Compare API keys in constant time so a mismatch leaks no prefix length
pub fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Gate for admin endpoints. `action` names the attempted operation in the audit log.
pub fn require_api_key(provided: &str, expected: &str, action: &str) -> Result<(), ApiError> {
    if keys_match(provided, expected) {
        Ok(())
    } else {
        warn!(action, "Unauthorized admin request");
        Err(ApiError::InvalidApiKey)
    }
}
