use crate::utils::time::current_timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    UserCreated,
    UserUpdated,
    UsernameChanged,
    PinChanged,
    UsersActivated,
    CapacityExhausted,
}

/// Administrative event reported to the operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: i64,
}

/// Fire-and-forget notification sink.
///
/// Every notification is logged; if a dispatcher is attached it is also queued for
/// delivery. Queueing never blocks and never fails the caller: when the queue is full
/// the notification is dropped.
pub struct Notifier {
    sender: Option<Sender<Notification>>,
}

impl Notifier {
    /// Log-only notifier
    pub fn log_only() -> Self {
        Self { sender: None }
    }

    /// Notifier whose events are also handed to the returned receiver, holding at most
    /// `capacity` undelivered events
    pub fn with_channel(capacity: usize) -> (Self, Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        let notification = Notification {
            kind,
            message: message.into(),
            timestamp: current_timestamp(),
        };

        info!(kind = ?notification.kind, "{}", notification.message);

        if let Some(sender) = &self.sender {
            match sender.try_send(notification) {
                Ok(()) => {}
                Err(TrySendError::Full(dropped)) => {
                    warn!(kind = ?dropped.kind, "Notification queue full, dropping notification");
                }
                Err(TrySendError::Closed(_)) => {
                    warn!("Notification dispatcher has stopped, dropping notification");
                }
            }
        }
    }
}
