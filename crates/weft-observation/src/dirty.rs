//! Dirty checking: polling fallback for properties that cannot be
//! intercepted.
//!
//! Computed (getter-only) properties, sealed properties, and writes through
//! [`Obj::set_silent`](crate::value::Obj::set_silent) are invisible to the
//! interception layer. For those, the locator hands out a
//! [`DirtyCheckProperty`] registered with the shared [`DirtyChecker`].
//!
//! # Scheduling
//!
//! The checker never owns a timer. The host runtime calls
//! [`DirtyChecker::flush`] between application turns (the cooperative
//! model: one recurring task, processed outside any mutation's call
//! stack). Each flush re-reads every registered property once and compares
//! by identity/equality — O(checked properties) per flush, with up to one
//! flush of notification latency.
//!
//! # Invariants
//!
//! 1. Exactly one notification per actual change; an unchanged value
//!    produces none, however many flushes run.
//! 2. A property is registered with the checker while it has at least one
//!    subscriber, and deregistered at zero.
//! 3. Properties whose object has been dropped are purged during flush.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::flags::BindingFlags;
use crate::property::{ChangeHandler, ChangeSubscribers, ObserverId, PropertyObserver};
use crate::subscriber::Subscription;
use crate::value::{Obj, Value, WeakObj};

/// Polling observer for one `(object, property)` pair.
pub struct DirtyCheckProperty {
    id: ObserverId,
    obj: WeakObj,
    name: String,
    last: RefCell<Value>,
    subscribers: ChangeSubscribers,
    checker: DirtyChecker,
}

impl DirtyCheckProperty {
    /// Create an observer for `(obj, name)` tied to `checker`.
    ///
    /// Registration with the checker happens on first subscribe, not at
    /// construction.
    #[must_use]
    pub fn new(obj: &Obj, name: &str, checker: DirtyChecker) -> Self {
        Self {
            id: ObserverId::next(),
            obj: obj.downgrade(),
            name: name.to_owned(),
            last: RefCell::new(obj.get(name)),
            subscribers: ChangeSubscribers::new(),
            checker,
        }
    }

    /// Re-read the property and notify if it changed since the last check.
    /// Returns whether a notification fired.
    ///
    /// Returns `None` when the observed object is gone (entry should be
    /// purged).
    fn check(&self, flags: BindingFlags) -> Option<bool> {
        let obj = self.obj.upgrade()?;
        let current = obj.get(&self.name);
        let previous = {
            let mut last = self.last.borrow_mut();
            if *last == current {
                return Some(false);
            }
            std::mem::replace(&mut *last, current.clone())
        };
        for handler in self.subscribers.snapshot() {
            handler(&current, &previous, flags | BindingFlags::FROM_FLUSH);
        }
        Some(true)
    }
}

impl PropertyObserver for DirtyCheckProperty {
    fn id(&self) -> ObserverId {
        self.id
    }

    fn value(&self) -> Value {
        match self.obj.upgrade() {
            Some(obj) => obj.get(&self.name),
            None => Value::Null,
        }
    }

    fn set_value(&self, value: Value, flags: BindingFlags) {
        let Some(obj) = self.obj.upgrade() else {
            return;
        };
        if obj.is_computed(&self.name) {
            tracing::debug!(property = %self.name, "ignoring write to computed property");
            return;
        }
        let old = obj.get_raw(&self.name);
        if old == value {
            return;
        }
        obj.set_raw(&self.name, value.clone());
        *self.last.borrow_mut() = value.clone();
        for handler in self.subscribers.snapshot() {
            handler(&value, &old, flags);
        }
    }

    fn subscribe(self: Rc<Self>, handler: ChangeHandler) -> Subscription {
        if self.subscribers.is_empty() {
            // Re-baseline so changes that predate observation don't fire.
            if let Some(obj) = self.obj.upgrade() {
                *self.last.borrow_mut() = obj.get(&self.name);
            }
            self.checker.register(Rc::clone(&self));
        }
        let id = self.subscribers.add(handler);
        let weak = Rc::downgrade(&self);
        Subscription::new(move || {
            let Some(observer) = weak.upgrade() else {
                return;
            };
            if observer.subscribers.remove(id) == 0 {
                tracing::trace!(property = %observer.name, "dropping dirty-check registration");
                observer.checker.deregister(observer.id);
                if let Some(obj) = observer.obj.upgrade() {
                    obj.remove_observer(&observer.name);
                }
            }
        })
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for DirtyCheckProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirtyCheckProperty")
            .field("id", &self.id)
            .field("property", &self.name)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[derive(Default)]
struct DirtyCheckerInner {
    entries: RefCell<Vec<(ObserverId, Weak<DirtyCheckProperty>)>>,
}

/// The shared polling scheduler. Cheap to clone (shared inner).
#[derive(Clone, Default)]
pub struct DirtyChecker {
    inner: Rc<DirtyCheckerInner>,
}

impl DirtyChecker {
    /// Create a checker with no registered properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one flush cycle: check every registered property once.
    /// Returns the number of notifications fired.
    pub fn flush(&self, flags: BindingFlags) -> usize {
        let snapshot: Vec<(ObserverId, Weak<DirtyCheckProperty>)> =
            self.inner.entries.borrow().clone();
        let mut notified = 0;
        let mut dead = Vec::new();
        for (id, weak) in snapshot {
            match weak.upgrade().and_then(|p| p.check(flags)) {
                Some(true) => notified += 1,
                Some(false) => {}
                None => dead.push(id),
            }
        }
        if !dead.is_empty() {
            self.inner
                .entries
                .borrow_mut()
                .retain(|(id, _)| !dead.contains(id));
        }
        tracing::trace!(notified, "dirty-check flush");
        notified
    }

    /// Number of currently registered properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    fn register(&self, property: Rc<DirtyCheckProperty>) {
        self.inner
            .entries
            .borrow_mut()
            .push((property.id, Rc::downgrade(&property)));
    }

    fn deregister(&self, id: ObserverId) {
        self.inner.entries.borrow_mut().retain(|(eid, _)| *eid != id);
    }
}

impl fmt::Debug for DirtyChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirtyChecker")
            .field("registered", &self.len())
            .finish()
    }
}
