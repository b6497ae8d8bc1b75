//! Generic publish/subscribe event feed, grounded on the original
//! `EventFeed<T>`: a mutex-guarded callback list where `publish` holds the
//! lock for the whole sweep so subscribe/publish are mutually exclusive
//! and subscribers see a total order consistent with publication.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// A typed publish/subscribe buffer. A callback that panics is absorbed —
/// it does not prevent subsequent callbacks from running and never
/// propagates to the publisher.
pub struct EventFeed<T> {
    subscribers: Mutex<Vec<Callback<T>>>,
}

impl<T> EventFeed<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a callback, appended after any existing ones.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut subs = self.subscribers.lock().expect("event feed mutex poisoned");
        subs.push(Box::new(callback));
    }

    /// Invokes every registered callback with `event`, in registration
    /// order, under the feed's mutex. A callback that panics is caught and
    /// discarded; the sweep continues.
    pub fn publish(&self, event: &T) {
        let subs = self.subscribers.lock().expect("event feed mutex poisoned");
        for callback in subs.iter() {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::warn!("event feed subscriber panicked; continuing with remaining subscribers");
            }
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("event feed mutex poisoned").len()
    }
}

impl<T> Default for EventFeed<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn subscribers_invoked_in_registration_order() {
        let feed: EventFeed<i32> = EventFeed::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = order.clone();
        feed.subscribe(move |v: &i32| o1.lock().unwrap().push(("first", *v)));
        let o2 = order.clone();
        feed.subscribe(move |v: &i32| o2.lock().unwrap().push(("second", *v)));

        feed.publish(&42);

        let recorded = order.lock().unwrap();
        assert_eq!(*recorded, vec![("first", 42), ("second", 42)]);
    }

    #[test]
    fn panicking_subscriber_does_not_block_others() {
        let feed: EventFeed<i32> = EventFeed::new();
        let count = Arc::new(AtomicUsize::new(0));

        feed.subscribe(|_: &i32| panic!("boom"));
        let c = count.clone();
        feed.subscribe(move |_: &i32| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        feed.publish(&1);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscriber_count_tracks_registrations() {
        let feed: EventFeed<i32> = EventFeed::new();
        assert_eq!(feed.subscriber_count(), 0);
        feed.subscribe(|_: &i32| {});
        feed.subscribe(|_: &i32| {});
        assert_eq!(feed.subscriber_count(), 2);
    }
}
