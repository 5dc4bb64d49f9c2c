use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Single-slot holder of the latest observed state of a toggle.
///
/// Writes replace the whole value, so readers only ever see a string that
/// some completed probe or action published. Clones share the same slot.
#[derive(Debug)]
pub struct StateStore {
    sender: Arc<watch::Sender<String>>,
}

impl Clone for StateStore {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Creates a store holding the empty string
    pub fn new() -> Self {
        let (sender, _) = watch::channel(String::new());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Returns the most recently published state
    pub fn get(&self) -> String {
        self.sender.borrow().clone()
    }

    /// Replaces the state and wakes every live subscription
    pub fn set(&self, value: impl Into<String>) {
        let value = value.into();
        let previous = self.sender.send_replace(value.clone());
        debug!(
            "State replaced: {:?} -> {:?} ({} subscriber(s))",
            previous,
            value,
            self.sender.receiver_count()
        );
    }

    /// Registers a new subscription. Only `set` calls made after this
    /// point are signalled to it.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of subscriptions that have not been cancelled or dropped
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A revocable registration against a [`StateStore`].
///
/// Dropping the subscription cancels it.
#[derive(Debug)]
pub struct Subscription {
    receiver: watch::Receiver<String>,
}

impl Subscription {
    /// Waits for the next `set` on the store.
    ///
    /// Several sets that happen before this is polled collapse into a
    /// single wakeup; the store then holds the latest of them. Returns
    /// `false` once every handle to the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Releases the subscription
    pub fn cancel(self) {
        drop(self);
    }
}
