use crate::core::error::RegistryError;
use crate::models::user::User;
use crate::notify::notifier::{NotificationKind, Notifier};
use crate::stores::user_store::UserStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Access checks, PIN hand-off to the door controller and activation bookkeeping
pub struct AccessService {
    store: Arc<UserStore>,
    capacity: usize,
    notifier: Arc<Notifier>,
}

impl AccessService {
    pub fn new(store: Arc<UserStore>, capacity: usize, notifier: Arc<Notifier>) -> Self {
        Self {
            store,
            capacity,
            notifier,
        }
    }

    /// The record for `installation_id`, only if it exists and is active
    pub fn get_active_user(&self, installation_id: &str) -> Option<Arc<User>> {
        self.store
            .find_by_installation_id(installation_id)
            .filter(|user| user.active)
    }

    /// PINs awaiting delivery, indexed by serial id.
    ///
    /// Only active users with a PIN that has not been cleared yet appear.
    pub fn list_active_pins(&self) -> Vec<Option<String>> {
        let mut pins = vec![None; self.capacity];
        for user in self.store.find_by_active(true) {
            if let (Some(pin), Some(slot)) = (&user.pin, pins.get_mut(user.serial_id)) {
                *slot = Some(pin.clone());
            }
        }
        pins
    }

    /// Clear delivered PINs.
    ///
    /// Every slot must belong to a user and the batch is stored as one unit; on any error,
    /// including a storage failure, nothing is cleared.
    pub fn clear_pins(&self, serial_ids: &[usize]) -> Result<Vec<Arc<User>>, RegistryError> {
        let _writes = self.store.lock_writes();

        let users = serial_ids
            .iter()
            .map(|&serial_id| {
                self.store
                    .find_by_serial_id(serial_id)
                    .map(|user| User {
                        pin: None,
                        ..(*user).clone()
                    })
                    .ok_or(RegistryError::RecordNotFound { serial_id })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cleared = self.store.save_all(users)?;

        debug!(count = cleared.len(), "Pins cleared");
        Ok(cleared)
    }

    /// Activate every user that is inactive and still new
    pub fn activate_all_pending_new(&self) -> Result<Vec<Arc<User>>, RegistryError> {
        let _writes = self.store.lock_writes();

        let pending: Vec<User> = self
            .store
            .find_by_active(false)
            .into_iter()
            .filter(|user| user.is_new_user)
            .map(|user| User {
                active: true,
                ..(*user).clone()
            })
            .collect();

        let activated = self.store.save_all(pending)?;

        if !activated.is_empty() {
            let names: Vec<&str> = activated.iter().map(|user| user.username.as_str()).collect();
            self.notifier.notify(
                NotificationKind::UsersActivated,
                format!("activated {} user(s): {}", activated.len(), names.join(", ")),
            );
        }

        Ok(activated)
    }

    /// Administrative delete; frees the user's serial id
    pub fn delete_user(&self, id: u64) -> Result<Arc<User>, RegistryError> {
        let _writes = self.store.lock_writes();

        let user = self
            .store
            .delete(id)?
            .ok_or(RegistryError::UnknownUser { id })?;

        info!(user_id = id, serial_id = user.serial_id, "User deleted");
        Ok(user)
    }

    pub fn list_users(&self) -> Vec<Arc<User>> {
        self.store.find_all()
    }

    pub fn user_count(&self) -> usize {
        self.store.count()
    }
}
