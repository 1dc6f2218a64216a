use crate::core::error::StoreError;
use crate::models::user::User;
use crate::wal::wal::{Wal, WalOperation};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory user records, optionally backed by a write-ahead log.
///
/// Reads are lock-free. Writers that read-decide-write (registration, pin clearing,
/// activation, delete) hold [`UserStore::lock_writes`] for the whole sequence.
pub struct UserStore {
    users: DashMap<u64, Arc<User>>,
    next_id: AtomicU64,
    writes: Mutex<()>,
    wal: Option<Wal>,
}

impl UserStore {
    /// Create a store that keeps records in memory only
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicU64::new(1),
            writes: Mutex::new(()),
            wal: None,
        }
    }

    /// Create a store that logs every mutation to `wal` before applying it
    pub fn with_wal(wal: Wal) -> Self {
        Self {
            wal: Some(wal),
            ..Self::new()
        }
    }

    /// Serialize writers. A poisoned lock is recovered since the guarded value is `()`.
    pub fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserve a fresh record id
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// All records ordered by id
    pub fn find_all(&self) -> Vec<Arc<User>> {
        let mut users: Vec<Arc<User>> = self
            .users
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        users.sort_by_key(|user| user.id);
        users
    }

    pub fn find_by_id(&self, id: u64) -> Option<Arc<User>> {
        self.users.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn find_by_installation_id(&self, installation_id: &str) -> Option<Arc<User>> {
        self.find_first(|user| user.installation_id == installation_id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<Arc<User>> {
        self.find_first(|user| user.username == username)
    }

    pub fn find_by_serial_id(&self, serial_id: usize) -> Option<Arc<User>> {
        self.find_first(|user| user.serial_id == serial_id)
    }

    pub fn find_by_active(&self, active: bool) -> Vec<Arc<User>> {
        self.find_all()
            .into_iter()
            .filter(|user| user.active == active)
            .collect()
    }

    /// Insert or replace a record.
    ///
    /// Rejects a record whose serial id or installation id is held by a different record.
    pub fn save(&self, user: User) -> Result<Arc<User>, StoreError> {
        self.check_conflicts(&user)?;

        if let Some(wal) = &self.wal {
            wal.log_operation(&WalOperation::SaveUser(user.clone()))?;
        }

        Ok(self.restore(user))
    }

    /// Insert or replace several records as one unit.
    ///
    /// Each record is checked against the stored ones and the batch is logged with a single
    /// write; on any error no record is applied.
    pub fn save_all(&self, users: Vec<User>) -> Result<Vec<Arc<User>>, StoreError> {
        for user in &users {
            self.check_conflicts(user)?;
        }

        if let Some(wal) = &self.wal {
            let operations: Vec<WalOperation> =
                users.iter().cloned().map(WalOperation::SaveUser).collect();
            wal.log_operations(&operations)?;
        }

        Ok(users.into_iter().map(|user| self.restore(user)).collect())
    }

    /// Remove a record, freeing its serial id
    pub fn delete(&self, id: u64) -> Result<Option<Arc<User>>, StoreError> {
        if !self.users.contains_key(&id) {
            return Ok(None);
        }

        if let Some(wal) = &self.wal {
            wal.log_operation(&WalOperation::DeleteUser { id })?;
        }

        Ok(self.users.remove(&id).map(|(_, user)| user))
    }

    /// Apply a replayed record without logging it again
    pub fn restore(&self, user: User) -> Arc<User> {
        self.next_id.fetch_max(user.id + 1, Ordering::Relaxed);
        let user = Arc::new(user);
        self.users.insert(user.id, Arc::clone(&user));
        user
    }

    /// Apply a replayed delete without logging it again
    pub fn forget(&self, id: u64) {
        self.users.remove(&id);
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn check_conflicts(&self, user: &User) -> Result<(), StoreError> {
        for entry in self.users.iter() {
            let other = entry.value();
            if other.id == user.id {
                continue;
            }
            if other.serial_id == user.serial_id {
                return Err(StoreError::SerialIdConflict {
                    serial_id: user.serial_id,
                    holder: other.id,
                });
            }
            if other.installation_id == user.installation_id {
                return Err(StoreError::InstallationIdConflict { holder: other.id });
            }
        }
        Ok(())
    }

    fn find_first<F>(&self, predicate: F) -> Option<Arc<User>>
    where
        F: Fn(&User) -> bool,
    {
        self.users
            .iter()
            .find(|entry| predicate(entry.value()))
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user(store: &UserStore, installation_id: &str, username: &str, serial_id: usize) -> User {
        User::new(store.next_id(), installation_id, username, "1234", serial_id)
    }

    #[test]
    fn test_save_and_lookups() {
        let store = UserStore::new();
        let saved = store.save(user(&store, "installation-a", "alice", 0)).unwrap();

        assert_eq!(store.count(), 1);
        assert_eq!(store.find_by_id(saved.id).unwrap().username, "alice");
        assert_eq!(store.find_by_installation_id("installation-a").unwrap().id, saved.id);
        assert_eq!(store.find_by_username("alice").unwrap().id, saved.id);
        assert_eq!(store.find_by_serial_id(0).unwrap().id, saved.id);
        assert!(store.find_by_username("bob").is_none());
        assert_eq!(store.find_by_active(false).len(), 1);
        assert!(store.find_by_active(true).is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let store = UserStore::new();
        let first = store.save(user(&store, "installation-a", "alice", 0)).unwrap();
        store.delete(first.id).unwrap();
        let second = store.save(user(&store, "installation-b", "bob", 0)).unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn test_save_rejects_duplicate_serial_id() {
        let store = UserStore::new();
        let first = store.save(user(&store, "installation-a", "alice", 2)).unwrap();

        let result = store.save(user(&store, "installation-b", "bob", 2));
        match result {
            Err(StoreError::SerialIdConflict { serial_id, holder }) => {
                assert_eq!(serial_id, 2);
                assert_eq!(holder, first.id);
            }
            other => panic!("Expected SerialIdConflict, got {:?}", other),
        }
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_save_rejects_duplicate_installation_id() {
        let store = UserStore::new();
        store.save(user(&store, "installation-a", "alice", 0)).unwrap();

        let result = store.save(user(&store, "installation-a", "bob", 1));
        assert!(matches!(result, Err(StoreError::InstallationIdConflict { .. })));
    }

    #[test]
    fn test_save_replaces_same_id() {
        let store = UserStore::new();
        let saved = store.save(user(&store, "installation-a", "alice", 0)).unwrap();

        let mut updated = (*saved).clone();
        updated.active = true;
        store.save(updated).unwrap();

        assert_eq!(store.count(), 1);
        assert!(store.find_by_id(saved.id).unwrap().active);
    }

    #[test]
    fn test_delete_unknown_is_none() {
        let store = UserStore::new();
        assert!(store.delete(42).unwrap().is_none());
    }

    #[test]
    fn test_mutations_are_logged() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("users.wal");
        let store = UserStore::with_wal(Wal::new(wal_path.clone()).unwrap());

        let saved = store.save(user(&store, "installation-a", "alice", 0)).unwrap();
        store.delete(saved.id).unwrap();

        let operations = Wal::new(wal_path).unwrap().replay().unwrap();
        assert_eq!(operations.len(), 2);
        assert_eq!(operations[0], WalOperation::SaveUser((*saved).clone()));
        assert_eq!(operations[1], WalOperation::DeleteUser { id: saved.id });
    }

    #[test]
    fn test_save_all_rejects_whole_batch_on_conflict() {
        let store = UserStore::new();
        let alice = store.save(user(&store, "installation-a", "alice", 0)).unwrap();
        store.save(user(&store, "installation-b", "bob", 1)).unwrap();

        let mut activated = (*alice).clone();
        activated.active = true;
        let clashing = user(&store, "installation-c", "carol", 1);

        let result = store.save_all(vec![activated, clashing]);
        assert!(matches!(result, Err(StoreError::SerialIdConflict { serial_id: 1, .. })));
        assert!(!store.find_by_id(alice.id).unwrap().active);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_save_all_is_logged() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("users.wal");
        let store = UserStore::with_wal(Wal::new(wal_path.clone()).unwrap());

        let saved = store
            .save_all(vec![
                user(&store, "installation-a", "alice", 0),
                user(&store, "installation-b", "bob", 1),
            ])
            .unwrap();

        assert_eq!(store.count(), 2);
        let operations = Wal::new(wal_path).unwrap().replay().unwrap();
        assert_eq!(
            operations,
            saved
                .iter()
                .map(|user| WalOperation::SaveUser((**user).clone()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_restore_advances_id_sequence() {
        let store = UserStore::new();
        store.restore(User::new(41, "installation-a", "alice", "1234", 0));

        assert_eq!(store.next_id(), 42);
    }
}
