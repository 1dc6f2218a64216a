use crate::core::error::RegistryError;
use crate::notify::notifier::{NotificationKind, Notifier};
use crate::stores::user_store::UserStore;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Size of the door controller's PIN table
pub const DEFAULT_MAX_SERIAL_ID: usize = 16;

/// Lowest slot in `[0, capacity)` not present in `occupied`
pub fn lowest_free_slot<I>(occupied: I, capacity: usize) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut used = vec![false; capacity];
    for serial_id in occupied {
        match used.get_mut(serial_id) {
            Some(slot) => *slot = true,
            None => warn!(serial_id, capacity, "Stored serial id outside capacity, ignoring"),
        }
    }
    used.iter().position(|used| !used)
}

/// Hands out serial ids for new users, always the lowest free one.
///
/// Purely a function of the store contents; nothing is reserved. Callers hold the store's
/// write lock until the record carrying the id is saved.
pub struct SerialIdAllocator {
    capacity: usize,
    notifier: Arc<Notifier>,
}

impl SerialIdAllocator {
    pub fn new(capacity: usize, notifier: Arc<Notifier>) -> Self {
        Self { capacity, notifier }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn find_free_serial_id(&self, store: &UserStore) -> Result<usize, RegistryError> {
        let occupied = store.find_all().into_iter().map(|user| user.serial_id);

        match lowest_free_slot(occupied, self.capacity) {
            Some(serial_id) => {
                debug!(serial_id, "Found free serial id");
                Ok(serial_id)
            }
            None => {
                error!(capacity = self.capacity, "Serial id pool exhausted");
                self.notifier.notify(
                    NotificationKind::CapacityExhausted,
                    format!("too many users - all {} serial ids in use", self.capacity),
                );
                Err(RegistryError::CapacityExhausted {
                    capacity: self.capacity,
                })
            }
        }
    }
}
