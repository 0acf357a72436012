//! Subscriber bookkeeping shared by every observer variant.
//!
//! [`Subscribers`] is an ordered, id-keyed list of callbacks. Notification
//! works on a snapshot of the list, so a callback that unsubscribes itself
//! (or another subscriber) mid-notification neither skips nor
//! double-notifies anyone in the same cycle.
//!
//! [`Subscription`] is the RAII side: dropping it runs a cancel closure
//! supplied by whichever observer created it. Observers use that closure to
//! remove the callback and, on the last removal, tear themselves down.

use std::cell::{Cell, RefCell};
use std::fmt;

/// Ordered collection of subscriber callbacks of handler type `H`.
///
/// # Invariants
///
/// 1. Callbacks are stored and notified in registration order.
/// 2. `snapshot()` clones the current handler list; mutation during
///    iteration of a snapshot cannot corrupt the live list.
/// 3. Ids are never reused within one collection.
pub struct Subscribers<H> {
    entries: RefCell<Vec<(u64, H)>>,
    next_id: Cell<u64>,
}

impl<H: Clone> Subscribers<H> {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Add a handler, returning its id for later removal.
    pub fn add(&self, handler: H) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, handler));
        id
    }

    /// Remove the handler with `id`. Returns the remaining count.
    ///
    /// Removing an unknown id is a no-op.
    pub fn remove(&self, id: u64) -> usize {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|(eid, _)| *eid != id);
        entries.len()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no subscribers remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Clone the current handlers, in registration order.
    ///
    /// Callers iterate the snapshot so that re-entrant `add`/`remove`
    /// calls from inside a handler only affect later cycles.
    #[must_use]
    pub fn snapshot(&self) -> Vec<H> {
        self.entries.borrow().iter().map(|(_, h)| h.clone()).collect()
    }
}

impl<H: Clone> Default for Subscribers<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for Subscribers<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.entries.borrow().len())
            .finish()
    }
}

/// RAII guard for one observer subscription.
///
/// Dropping the guard runs the cancel closure exactly once, removing the
/// callback before the next notification cycle. Cancelling is always safe,
/// including from within a notification callback.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a cancel closure.
    #[must_use]
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
