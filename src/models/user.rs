use serde::Serialize;

/// A registered installation and its access-control state
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    /// Store-assigned identity, never reused
    pub id: u64,
    /// Stable identifier of the physical client, immutable after creation
    pub installation_id: String,
    pub username: String,
    /// 4-character PIN; cleared once delivered to the door controller
    #[serde(skip_serializing)]
    pub pin: Option<String>,
    /// Slot in the fixed-size controller PIN table
    pub serial_id: usize,
    pub active: bool,
    /// True until the first bulk activation or re-registration
    pub is_new_user: bool,
}

/// Previous field values captured while applying a registration update.
///
/// Only meaningful for reporting; never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub previous_username: Option<String>,
    pub previous_pin: Option<String>,
    /// Set when the PIN changed, including when a cleared PIN was set again
    pub pin_changed: bool,
}

impl ChangeSummary {
    pub fn username_changed(&self) -> bool {
        self.previous_username.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.username_changed() && !self.pin_changed
    }
}

impl User {
    /// Build a brand-new, inactive record awaiting bulk activation
    pub fn new(id: u64, installation_id: &str, username: &str, pin: &str, serial_id: usize) -> Self {
        Self {
            id,
            installation_id: installation_id.to_string(),
            username: username.to_string(),
            pin: Some(pin.to_string()),
            serial_id,
            active: false,
            is_new_user: true,
        }
    }

    /// Set username and PIN, returning what they were before if they changed
    pub fn apply_update(&mut self, username: &str, pin: &str) -> ChangeSummary {
        let mut changes = ChangeSummary::default();

        if self.username != username {
            changes.previous_username = Some(std::mem::replace(&mut self.username, username.to_string()));
        }

        if self.pin.as_deref() != Some(pin) {
            changes.previous_pin = self.pin.replace(pin.to_string());
            changes.pin_changed = true;
        }

        changes
    }
}
