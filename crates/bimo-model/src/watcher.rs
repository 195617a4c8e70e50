#![forbid(unsafe_code)]

//! Change callbacks.
//!
//! A [`Watcher`] is a cloneable handle to a callback. Identity is the shared
//! allocation: clones of one handle are the same watcher, two handles built
//! from identical closures are not. The model relies on this identity to
//! suppress duplicate subscriptions, to de-duplicate batched notification,
//! and to unsubscribe.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Callback panics | Panic is caught and logged; remaining watchers still run |

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use ahash::AHashSet;

use crate::delta::Changes;

type WatchFn = dyn Fn(&Changes);

/// Shared handle to a change callback.
#[derive(Clone)]
pub struct Watcher {
    callback: Rc<WatchFn>,
}

impl Watcher {
    pub fn new(callback: impl Fn(&Changes) + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Whether both handles refer to the same callback.
    #[must_use]
    pub fn same(&self, other: &Watcher) -> bool {
        self.addr() == other.addr()
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.callback).cast::<()>()
    }

    /// Run the callback, containing a panic to this watcher.
    fn invoke(&self, changes: &Changes) -> bool {
        let callback = Rc::clone(&self.callback);
        catch_unwind(AssertUnwindSafe(|| callback(changes))).is_ok()
    }
}

impl PartialEq for Watcher {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Watcher {}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("addr", &self.addr())
            .finish()
    }
}

/// Append `watcher` unless it is already present.
pub(crate) fn push_unique(list: &mut Vec<Watcher>, watcher: &Watcher) -> bool {
    if list.iter().any(|w| w.same(watcher)) {
        false
    } else {
        list.push(watcher.clone());
        true
    }
}

/// Remove `watcher` by index. Returns whether it was subscribed.
pub(crate) fn remove(list: &mut Vec<Watcher>, watcher: &Watcher) -> bool {
    match list.iter().position(|w| w.same(watcher)) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => false,
    }
}

/// Union of several watcher lists, first occurrence wins the order slot.
pub(crate) fn distinct<'a>(lists: impl IntoIterator<Item = &'a [Watcher]>) -> Vec<Watcher> {
    let mut seen = AHashSet::new();
    let mut out = Vec::new();
    for list in lists {
        for w in list {
            if seen.insert(w.addr()) {
                out.push(w.clone());
            }
        }
    }
    out
}

/// Invoke every watcher in order with the same payload.
///
/// Returns the number of watchers that panicked.
pub(crate) fn notify(watchers: &[Watcher], changes: &Changes) -> usize {
    let mut failed = 0;
    for watcher in watchers {
        if !watcher.invoke(changes) {
            failed += 1;
            tracing::error!(
                fields = ?changes.keys().collect::<Vec<_>>(),
                "watcher panicked; continuing with remaining watchers"
            );
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::Subscriber;
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    /// Counts ERROR-level events.
    struct ErrorCount(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorCount {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn clones_share_identity() {
        let a = Watcher::new(|_| {});
        let b = a.clone();
        let c = Watcher::new(|_| {});
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn push_unique_suppresses_duplicates() {
        let a = Watcher::new(|_| {});
        let mut list = Vec::new();
        assert!(push_unique(&mut list, &a));
        assert!(!push_unique(&mut list, &a.clone()));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_takes_out_only_the_target() {
        let a = Watcher::new(|_| {});
        let b = Watcher::new(|_| {});
        let c = Watcher::new(|_| {});
        let mut list = vec![a.clone(), b.clone(), c.clone()];
        assert!(remove(&mut list, &b));
        assert_eq!(list, vec![a, c]);
        assert!(!remove(&mut list, &b));
    }

    #[test]
    fn distinct_keeps_first_order() {
        let a = Watcher::new(|_| {});
        let b = Watcher::new(|_| {});
        let first = vec![a.clone(), b.clone()];
        let second = vec![b.clone(), a.clone()];
        let out = distinct([first.as_slice(), second.as_slice()]);
        assert_eq!(out, vec![a, b]);
    }

    #[test]
    fn panicking_watcher_does_not_stop_the_rest() {
        let hits = Rc::new(Cell::new(0));
        let h1 = Rc::clone(&hits);
        let h2 = Rc::clone(&hits);
        let watchers = vec![
            Watcher::new(move |_| h1.set(h1.get() + 1)),
            Watcher::new(|_| panic!("boom")),
            Watcher::new(move |_| h2.set(h2.get() + 1)),
        ];
        let failed = notify(&watchers, &Changes::new());
        assert_eq!(failed, 1);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn panics_are_logged_at_error_level() {
        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorCount(Arc::clone(&errors)));
        let _guard = tracing::subscriber::set_default(subscriber);

        let watchers = vec![Watcher::new(|_| panic!("first")), Watcher::new(|_| {})];
        notify(&watchers, &Changes::new());

        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }
}
