use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::config::NotifyConfig;
use crate::notify::notifier::Notifier;
use crate::notify::webhook::{spawn_dispatcher, WebhookClient};
use crate::stores::user_store::UserStore;
use crate::wal::wal::{Wal, WalOperation};

// this runs at boot time
pub fn apply_wal_operations(store: &UserStore, operations: &[WalOperation]) {
    for op in operations {
        match op {
            WalOperation::SaveUser(user) => {
                store.restore(user.clone());
            }
            WalOperation::DeleteUser { id } => {
                store.forget(*id);
            }
        }
    }
}

/// Open the WAL, replay it and return a store that keeps logging to it
pub fn load_store(wal: Wal, capacity: usize) -> Result<UserStore> {
    let operations = wal.replay().context("Failed to replay WAL")?;
    let store = UserStore::with_wal(wal);

    apply_wal_operations(&store, &operations);

    for user in store.find_all() {
        if user.serial_id >= capacity {
            warn!(
                user_id = user.id,
                serial_id = user.serial_id,
                capacity,
                "Stored serial id exceeds configured capacity"
            );
        }
    }

    info!(
        operations_replayed = operations.len(),
        users_loaded = store.count(),
        "WAL replay completed"
    );

    Ok(store)
}

/// Build the notifier; with a webhook configured, start the delivery task.
///
/// Must run inside the Tokio runtime when a webhook is configured.
pub fn build_notifier(config: &NotifyConfig) -> Result<Notifier> {
    let Some(url) = &config.webhook_url else {
        info!("No notification webhook configured, notifications are logged only");
        return Ok(Notifier::log_only());
    };

    let client = WebhookClient::new(url.clone(), config.api_key.clone(), config.timeout())
        .context("Failed to create webhook client")?;
    let (notifier, receiver) = Notifier::with_channel(config.queue_capacity);
    spawn_dispatcher(receiver, client);

    info!(webhook = %url, "Notification dispatcher started");
    Ok(notifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::User;
    use tempfile::TempDir;

    #[test]
    fn test_load_store_replays_history() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("registry.wal");

        {
            let store = UserStore::with_wal(Wal::new(wal_path.clone()).unwrap());
            let alice = store
                .save(User::new(store.next_id(), "installation-a", "alice", "1234", 0))
                .unwrap();
            let bob = store
                .save(User::new(store.next_id(), "installation-b", "bob", "5678", 1))
                .unwrap();

            let mut renamed = (*alice).clone();
            renamed.username = "alicia".to_string();
            renamed.pin = None;
            store.save(renamed).unwrap();
            store.delete(bob.id).unwrap();
        }

        let store = load_store(Wal::new(wal_path.clone()).unwrap(), 16).unwrap();

        assert_eq!(store.count(), 1);
        let alice = store.find_by_installation_id("installation-a").unwrap();
        assert_eq!(alice.username, "alicia");
        assert_eq!(alice.pin, None);
        assert!(store.find_by_serial_id(1).is_none());

        // Ids continue after the highest replayed one and new writes keep logging
        let carol = store
            .save(User::new(store.next_id(), "installation-c", "carol", "0000", 1))
            .unwrap();
        assert_eq!(carol.id, 3);
        assert_eq!(Wal::new(wal_path).unwrap().replay().unwrap().len(), 5);
    }

    #[test]
    fn test_registration_with_unusual_pin_survives_restart() {
        use crate::services::registration::RegistrationService;
        use crate::services::serial_id::SerialIdAllocator;
        use std::sync::Arc;

        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("registry.wal");

        {
            let store = Arc::new(load_store(Wal::new(wal_path.clone()).unwrap(), 16).unwrap());
            let notifier = Arc::new(Notifier::log_only());
            let service = RegistrationService::new(
                Arc::clone(&store),
                SerialIdAllocator::new(16, Arc::clone(&notifier)),
                notifier,
            );
            service
                .register_or_update("alice", "12|4", "installation-a")
                .unwrap();
            service
                .register_or_update("bob", "a\nbc", "installation-b")
                .unwrap();
        }

        let store = load_store(Wal::new(wal_path).unwrap(), 16).unwrap();

        assert_eq!(store.count(), 2);
        let alice = store.find_by_installation_id("installation-a").unwrap();
        assert_eq!(alice.pin.as_deref(), Some("12|4"));
        let bob = store.find_by_installation_id("installation-b").unwrap();
        assert_eq!(bob.pin.as_deref(), Some("a\nbc"));
    }

    #[test]
    fn test_build_notifier_without_webhook() {
        let notifier = build_notifier(&NotifyConfig::default()).unwrap();
        notifier.notify(
            crate::notify::notifier::NotificationKind::UserCreated,
            "user alice created (serialId=0)",
        );
    }
}
