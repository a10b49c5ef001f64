//! Change notification fan-out.
//!
//! # Responsibility
//! - Track observers per resource path.
//! - Deliver one callback per matching subscription for every `notify` call.
//!
//! # Invariants
//! - A subscription matches its own path and every path below it, compared
//!   segment by segment (`/notes` matches `/notes/4`, not `/notesx`).
//! - Observers run after the registry lock is released, so they may
//!   subscribe, unsubscribe or read the store from inside the callback.
//! - No deduplication or coalescing happens here.

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Handle returned by [`NotificationHub::subscribe`].
pub type SubscriptionId = Uuid;

/// Receiver of mutation notifications.
pub trait ChangeObserver: Send + Sync {
    /// Called with the path the mutation was reported on.
    fn on_change(&self, path: &str);
}

impl<F> ChangeObserver for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_change(&self, path: &str) {
        self(path)
    }
}

struct Subscription {
    path: String,
    observer: Arc<dyn ChangeObserver>,
}

/// Thread-safe registry of path subscriptions.
#[derive(Default)]
pub struct NotificationHub {
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` for `path` and everything below it.
    pub fn subscribe(&self, path: &str, observer: Arc<dyn ChangeObserver>) -> SubscriptionId {
        let id = Uuid::new_v4();
        let path = normalize(path).to_string();
        debug!("event=change_subscribe module=notify status=ok path={path}");
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Subscription { path, observer });
        id
    }

    /// Removes one subscription. Returns `false` when it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Delivers a change on `path` and returns the number of observers called.
    pub fn notify(&self, path: &str) -> usize {
        let changed = normalize(path);
        let targets: Vec<Arc<dyn ChangeObserver>> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|subscription| covers(&subscription.path, changed))
            .map(|subscription| Arc::clone(&subscription.observer))
            .collect();

        for observer in &targets {
            observer.on_change(changed);
        }
        debug!(
            "event=change_notify module=notify status=ok path={changed} delivered={}",
            targets.len()
        );
        targets.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

fn normalize(path: &str) -> &str {
    path.trim_end_matches('/')
}

fn covers(subscribed: &str, changed: &str) -> bool {
    match changed.strip_prefix(subscribed) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{covers, ChangeObserver, NotificationHub};
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<dyn ChangeObserver>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = move |path: &str| sink.lock().unwrap().push(path.to_string());
        (seen, Arc::new(observer))
    }

    #[test]
    fn prefix_match_is_segment_aware() {
        assert!(covers("/notes", "/notes"));
        assert!(covers("/notes", "/notes/12"));
        assert!(!covers("/notes", "/notesx"));
        assert!(!covers("/notes/1", "/notes/12"));
        assert!(!covers("/notes/12", "/notes"));
    }

    #[test]
    fn collection_subscriber_hears_record_changes_but_not_siblings() {
        let hub = NotificationHub::new();
        let (notes_seen, notes_observer) = recorder();
        let (record_seen, record_observer) = recorder();
        hub.subscribe("/notes", notes_observer);
        hub.subscribe("/notes/1", record_observer);

        assert_eq!(hub.notify("/notes/1"), 2);
        assert_eq!(hub.notify("/notes/2"), 1);
        assert_eq!(hub.notify("/todos/1"), 0);

        assert_eq!(*notes_seen.lock().unwrap(), vec!["/notes/1", "/notes/2"]);
        assert_eq!(*record_seen.lock().unwrap(), vec!["/notes/1"]);
    }

    #[test]
    fn repeated_notifications_are_not_coalesced() {
        let hub = NotificationHub::new();
        let (seen, observer) = recorder();
        hub.subscribe("/todos/", observer);
        hub.notify("/todos/3");
        hub.notify("/todos/3");
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hub = NotificationHub::new();
        let (seen, observer) = recorder();
        let id = hub.subscribe("/todos", observer);
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        hub.notify("/todos");
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(hub.subscription_count(), 0);
    }

    #[test]
    fn observer_may_unsubscribe_itself_during_delivery() {
        let hub = Arc::new(NotificationHub::new());
        let slot = Arc::new(Mutex::new(None));
        let hub_ref = Arc::clone(&hub);
        let slot_ref = Arc::clone(&slot);
        let id = hub.subscribe(
            "/notes",
            Arc::new(move |_: &str| {
                if let Some(id) = slot_ref.lock().unwrap().take() {
                    hub_ref.unsubscribe(id);
                }
            }),
        );
        *slot.lock().unwrap() = Some(id);

        assert_eq!(hub.notify("/notes"), 1);
        assert_eq!(hub.notify("/notes"), 0);
    }
}
