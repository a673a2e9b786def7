//! Change notifications fired after a user mutation has been committed.

use std::fmt;

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChange {
    Created,
    Updated,
    Deleted,
}

impl UserChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserChange::Created => "created",
            UserChange::Updated => "updated",
            UserChange::Deleted => "deleted",
        }
    }
}

impl fmt::Display for UserChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives a tag for every committed mutation.
///
/// Called inline on the request path, so implementations must return
/// immediately and cannot fail the request. Anything slow belongs on a
/// spawned task or behind a channel.
pub trait UserObserver: Send + Sync {
    fn users_changed(&self, change: UserChange);
}

/// Logs each change.
#[derive(Clone, Debug, Default)]
pub struct LogObserver;

impl UserObserver for LogObserver {
    fn users_changed(&self, change: UserChange) {
        tracing::info!(change = %change, "UsersChanged. user {}", change);
    }
}

/// Publishes changes to any number of subscribers. Sending with nobody
/// listening is not an error.
#[derive(Clone, Debug)]
pub struct ChannelObserver {
    sender: broadcast::Sender<UserChange>,
}

impl ChannelObserver {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UserChange> {
        self.sender.subscribe()
    }
}

impl UserObserver for ChannelObserver {
    fn users_changed(&self, change: UserChange) {
        if self.sender.send(change).is_err() {
            tracing::debug!(change = %change, "no subscribers for user change");
        }
    }
}
