//! Change notification fan-out
//!
//! Consumers (popup, admin panel, CLI watchers) subscribe once and are told
//! about every successful store mutation, mirroring the host platform's
//! storage change events: the storage area plus an old/new value per key.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;

use crate::types::StorageKey;

/// Storage area name the store reports changes under.
pub const LOCAL_AREA: &str = "local";

/// Old and new value of one key in a change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    pub new_value: Value,
}

/// One successful write, possibly touching several keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub area: &'static str,
    pub changes: BTreeMap<&'static str, StorageChange>,
}

impl ChangeEvent {
    pub fn new() -> Self {
        Self {
            area: LOCAL_AREA,
            changes: BTreeMap::new(),
        }
    }

    pub fn with_change(mut self, key: StorageKey, old_value: Option<Value>, new_value: Value) -> Self {
        self.changes.insert(key.as_str(), StorageChange { old_value, new_value });
        self
    }

    pub fn get(&self, key: StorageKey) -> Option<&StorageChange> {
        self.changes.get(key.as_str())
    }

    pub fn touches(&self, key: StorageKey) -> bool {
        self.changes.contains_key(key.as_str())
    }
}

impl Default for ChangeEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`Notifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Registry of change subscribers.
pub struct Notifier {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback invoked after every successful mutation.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Receive change events over a channel. The subscription is dropped
    /// automatically once the receiver is gone.
    pub fn subscribe_channel(self: &Arc<Self>) -> mpsc::Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        let weak = Arc::downgrade(self);
        let id_slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&id_slot);
        let id = self.subscribe(move |event| {
            if tx.send(event.clone()).is_err() {
                let id = *slot.lock().unwrap_or_else(PoisonError::into_inner);
                if let (Some(id), Some(notifier)) = (id, weak.upgrade()) {
                    notifier.unsubscribe(id);
                }
            }
        });
        *id_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
        rx
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Deliver an event to every subscriber. Callbacks run outside the
    /// registry lock so they may subscribe or unsubscribe.
    pub fn notify(&self, event: &ChangeEvent) {
        let callbacks: Vec<Callback> = self.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for callback in callbacks {
            callback(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Callback)>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
