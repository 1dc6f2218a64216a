use crate::services::serial_id::lowest_free_slot;
use crate::stores::user_store::UserStore;
use crate::utils::time::{current_timestamp, seconds_since};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Metrics {
    pub registrations_created: AtomicU64,
    pub registrations_updated: AtomicU64,
    pub registrations_rejected: AtomicU64,
    pub access_granted: AtomicU64,
    pub access_denied: AtomicU64,
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub registrations_created: u64,
    pub registrations_updated: u64,
    pub registrations_rejected: u64,
    pub access_granted: u64,
    pub access_denied: u64,
    pub total_users: usize,
    pub active_users: usize,
    pub pending_new_users: usize,
    pub capacity: usize,
    pub free_slots: usize,
    /// Slot the next new installation would receive
    pub next_serial_id: Option<usize>,
    pub uptime_seconds: i64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            registrations_created: AtomicU64::new(0),
            registrations_updated: AtomicU64::new(0),
            registrations_rejected: AtomicU64::new(0),
            access_granted: AtomicU64::new(0),
            access_denied: AtomicU64::new(0),
            start_time: current_timestamp(),
        }
    }

    pub fn increment_created(&self) {
        self.registrations_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_updated(&self) {
        self.registrations_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.registrations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_access_granted(&self) {
        self.access_granted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_access_denied(&self) {
        self.access_denied.fetch_add(1, Ordering::Relaxed);
    }

    /// Combine the counters with the current store contents
    pub fn get_snapshot(&self, store: &UserStore, capacity: usize) -> MetricsSnapshot {
        let users = store.find_all();
        let active_users = users.iter().filter(|user| user.active).count();
        let pending_new_users = users
            .iter()
            .filter(|user| !user.active && user.is_new_user)
            .count();
        let occupied = users
            .iter()
            .filter(|user| user.serial_id < capacity)
            .count();

        MetricsSnapshot {
            registrations_created: self.registrations_created.load(Ordering::Relaxed),
            registrations_updated: self.registrations_updated.load(Ordering::Relaxed),
            registrations_rejected: self.registrations_rejected.load(Ordering::Relaxed),
            access_granted: self.access_granted.load(Ordering::Relaxed),
            access_denied: self.access_denied.load(Ordering::Relaxed),
            total_users: users.len(),
            active_users,
            pending_new_users,
            capacity,
            free_slots: capacity.saturating_sub(occupied),
            next_serial_id: lowest_free_slot(users.iter().map(|user| user.serial_id), capacity),
            uptime_seconds: seconds_since(self.start_time, current_timestamp()),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
