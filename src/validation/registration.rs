use crate::core::error::ValidationError;

pub const MIN_USERNAME_LEN: usize = 2;
pub const PIN_LEN: usize = 4;
pub const MIN_INSTALLATION_ID_LEN: usize = 10;

/// Check registration fields before anything touches the store.
///
/// Lengths are counted in characters, not bytes.
pub fn validate_registration(
    username: &str,
    pin: &str,
    installation_id: &str,
) -> Result<(), ValidationError> {
    let username_len = username.chars().count();
    if username_len < MIN_USERNAME_LEN {
        return Err(ValidationError::TooShort {
            field: "username",
            min: MIN_USERNAME_LEN,
            actual: username_len,
        });
    }

    let pin_len = pin.chars().count();
    if pin_len != PIN_LEN {
        return Err(ValidationError::InvalidLength {
            field: "pin",
            expected: PIN_LEN,
            actual: pin_len,
        });
    }

    let installation_id_len = installation_id.chars().count();
    if installation_id_len < MIN_INSTALLATION_ID_LEN {
        return Err(ValidationError::TooShort {
            field: "installation_id",
            min: MIN_INSTALLATION_ID_LEN,
            actual: installation_id_len,
        });
    }

    Ok(())
}
