//! Subscriber registry with cancellation tokens.
//!
//! Notification iterates a snapshot of the registered callbacks, so a
//! subscriber that cancels itself (or registers a new one) mid-tick cannot
//! corrupt the iteration.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use crate::domain::TickPayload;

/// Callback invoked once per tick.
pub type Subscriber = Arc<dyn Fn(&TickPayload) + Send + Sync>;

#[derive(Default)]
struct Inner {
    next_id: u64,
    // Ids are handed out in increasing order, so map order == registration order.
    subscribers: BTreeMap<u64, Subscriber>,
}

/// Shared registry handed to the worker thread and to API callers.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; the returned token removes only this entry.
    pub fn subscribe(&self, cb: Subscriber) -> Subscription {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(id, cb);
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver a payload to every subscriber, synchronously, in
    /// registration order.
    pub fn notify(&self, payload: &TickPayload) {
        let snapshot: Vec<Subscriber> = {
            let inner = self.inner.lock().unwrap();
            inner.subscribers.values().cloned().collect()
        };
        for cb in snapshot {
            cb(payload);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().subscribers.clear();
    }
}

/// Cancellation token returned by [`SubscriberRegistry::subscribe`].
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Inner>>,
}

impl Subscription {
    /// Remove this subscription; later subscriptions are untouched.
    /// A token whose registry is already gone is a no-op.
    pub fn cancel(self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.lock().unwrap().subscribers.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FormattedStamp, PayloadSource, SeriesStore, Summary};
    use chrono::NaiveDate;

    fn payload(tick: usize) -> TickPayload {
        let sim_date = NaiveDate::from_ymd_opt(2023, 7, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        TickPayload {
            tick,
            sim_date,
            formatted: FormattedStamp {
                date: "7/1/2023".to_string(),
                time: "08:00 AM".to_string(),
            },
            series: Arc::new(SeriesStore::default()),
            wafer_starts: 0.0,
            window: None,
            summary: Summary::default(),
            source: PayloadSource::Workbook,
        }
    }

    #[test]
    fn notifies_in_registration_order() {
        let registry = SubscriberRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            let _sub = registry.subscribe(Arc::new(move |_| {
                seen.lock().unwrap().push(tag);
            }));
        }

        registry.notify(&payload(0));
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn cancel_removes_only_itself() {
        let registry = SubscriberRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<Subscription> = ["a", "b", "c"]
            .into_iter()
            .map(|tag| {
                let seen = seen.clone();
                registry.subscribe(Arc::new(move |_| {
                    seen.lock().unwrap().push(tag);
                }))
            })
            .collect();

        let mut subs = subs.into_iter();
        let _a = subs.next().unwrap();
        subs.next().unwrap().cancel();

        registry.notify(&payload(0));
        assert_eq!(*seen.lock().unwrap(), vec!["a", "c"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn self_cancel_during_notification_is_safe() {
        let registry = SubscriberRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        {
            let seen = seen.clone();
            let slot_in_cb = slot.clone();
            let sub = registry.subscribe(Arc::new(move |_| {
                seen.lock().unwrap().push("self");
                if let Some(sub) = slot_in_cb.lock().unwrap().take() {
                    sub.cancel();
                }
            }));
            *slot.lock().unwrap() = Some(sub);
        }
        {
            let seen = seen.clone();
            let _later = registry.subscribe(Arc::new(move |_| {
                seen.lock().unwrap().push("later");
            }));
        }

        registry.notify(&payload(0));
        registry.notify(&payload(1));

        // First tick sees both; the self-cancelling one is gone on the second.
        assert_eq!(*seen.lock().unwrap(), vec!["self", "later", "later"]);
    }

    #[test]
    fn clear_empties_the_registry() {
        let registry = SubscriberRegistry::new();
        let _sub = registry.subscribe(Arc::new(|_| {}));
        assert_eq!(registry.len(), 1);
        registry.clear();
        assert!(registry.is_empty());
    }
}
