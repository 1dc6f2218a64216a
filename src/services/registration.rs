use crate::core::error::RegistryError;
use crate::models::user::{ChangeSummary, User};
use crate::notify::notifier::{NotificationKind, Notifier};
use crate::services::serial_id::SerialIdAllocator;
use crate::stores::user_store::UserStore;
use crate::validation::registration::validate_registration;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// A new installation got a record and a fresh serial id
    Created { user: Arc<User>, changes: ChangeSummary },
    /// A known installation re-registered; id and serial id are unchanged
    Updated { user: Arc<User>, changes: ChangeSummary },
}

impl RegistrationOutcome {
    pub fn user(&self) -> &Arc<User> {
        match self {
            RegistrationOutcome::Created { user, .. } | RegistrationOutcome::Updated { user, .. } => user,
        }
    }

    pub fn changes(&self) -> &ChangeSummary {
        match self {
            RegistrationOutcome::Created { changes, .. }
            | RegistrationOutcome::Updated { changes, .. } => changes,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RegistrationOutcome::Created { .. } => "created",
            RegistrationOutcome::Updated { .. } => "updated",
        }
    }
}

/// Creates users for new installations and updates the ones it already knows
pub struct RegistrationService {
    store: Arc<UserStore>,
    allocator: SerialIdAllocator,
    notifier: Arc<Notifier>,
}

impl RegistrationService {
    pub fn new(store: Arc<UserStore>, allocator: SerialIdAllocator, notifier: Arc<Notifier>) -> Self {
        Self {
            store,
            allocator,
            notifier,
        }
    }

    /// Register a new installation or update the record of a known one.
    ///
    /// A new installation whose username belongs to someone else is rejected with
    /// [`RegistryError::DuplicateUsername`]; so is renaming a known installation to a
    /// username held by another one.
    pub fn register_or_update(
        &self,
        username: &str,
        pin: &str,
        installation_id: &str,
    ) -> Result<RegistrationOutcome, RegistryError> {
        validate_registration(username, pin, installation_id)?;

        let outcome = {
            let _writes = self.store.lock_writes();

            match self.store.find_by_installation_id(installation_id) {
                Some(existing) => {
                    if existing.username != username {
                        self.ensure_username_free(username)?;
                    }

                    let mut user = (*existing).clone();
                    // A device that re-registers is no longer picked up by bulk activation
                    user.is_new_user = false;
                    let changes = user.apply_update(username, pin);
                    let user = self.store.save(user)?;
                    RegistrationOutcome::Updated { user, changes }
                }
                None => {
                    self.ensure_username_free(username)?;

                    let serial_id = self.allocator.find_free_serial_id(&self.store)?;
                    let user = User::new(self.store.next_id(), installation_id, username, pin, serial_id);
                    let user = self.store.save(user)?;
                    RegistrationOutcome::Created {
                        user,
                        changes: ChangeSummary::default(),
                    }
                }
            }
        };

        self.report(&outcome);
        Ok(outcome)
    }

    fn ensure_username_free(&self, username: &str) -> Result<(), RegistryError> {
        if self.store.find_by_username(username).is_some() {
            warn!(username, "Registration rejected, username already exists");
            return Err(RegistryError::DuplicateUsername(username.to_string()));
        }
        Ok(())
    }

    fn report(&self, outcome: &RegistrationOutcome) {
        let user = outcome.user();
        let changes = outcome.changes();

        if let Some(previous) = &changes.previous_username {
            self.notifier.notify(
                NotificationKind::UsernameChanged,
                format!(
                    "user {} changed name to {} (serialId={})",
                    previous, user.username, user.serial_id
                ),
            );
        }
        if changes.pin_changed {
            self.notifier.notify(
                NotificationKind::PinChanged,
                format!("user {} changed pin (serialId={})", user.username, user.serial_id),
            );
        }

        let kind = match outcome {
            RegistrationOutcome::Created { .. } => NotificationKind::UserCreated,
            RegistrationOutcome::Updated { .. } => NotificationKind::UserUpdated,
        };
        self.notifier.notify(
            kind,
            format!(
                "user {} {} (serialId={})",
                user.username,
                outcome.label(),
                user.serial_id
            ),
        );

        info!(
            user_id = user.id,
            serial_id = user.serial_id,
            outcome = outcome.label(),
            "Registration processed"
        );
    }
}
