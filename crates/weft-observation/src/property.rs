//! Property observers: the capability that detects and broadcasts writes
//! to one `(object, property)` pair.
//!
//! [`SetterObserver`] is the interception variant: installing it makes
//! [`Obj::set`](crate::value::Obj::set) route through
//! [`set_value`](PropertyObserver::set_value), which writes and fans out to
//! subscribers synchronously. Properties that cannot be intercepted fall
//! back to [`DirtyCheckProperty`](crate::dirty::DirtyCheckProperty).
//!
//! # Lifetime
//!
//! Observers are reference-counted by subscriber count. The last
//! unsubscribe removes the observer from the object's cache, uninstalling
//! interception. A later observation request creates a fresh observer.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::flags::BindingFlags;
use crate::subscriber::{Subscribers, Subscription};
use crate::value::{Obj, Value, WeakObj};

/// Change callback: `(new_value, previous_value, flags)`.
pub type ChangeHandler = Rc<dyn Fn(&Value, &Value, BindingFlags)>;

pub(crate) type ChangeSubscribers = Subscribers<ChangeHandler>;

/// Process-unique observer identity, used by bindings to deduplicate
/// observer slots across evaluation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Allocate the next id. Single-threaded, never reused.
    #[must_use]
    pub fn next() -> Self {
        thread_local! {
            static NEXT: Cell<u64> = const { Cell::new(0) };
        }
        NEXT.with(|next| {
            let id = next.get();
            next.set(id + 1);
            Self(id)
        })
    }
}

/// Capability shared by all property observer variants.
pub trait PropertyObserver {
    /// Identity of this observer instance.
    fn id(&self) -> ObserverId;

    /// Current value of the observed property.
    fn value(&self) -> Value;

    /// Write the property. Notifies subscribers only when the new value
    /// differs from the current one (idempotent-write suppression).
    fn set_value(&self, value: Value, flags: BindingFlags);

    /// Register a change callback. Dropping the returned [`Subscription`]
    /// unsubscribes; the last unsubscribe tears the observer down.
    fn subscribe(self: Rc<Self>, handler: ChangeHandler) -> Subscription;

    /// Number of live subscribers.
    fn subscriber_count(&self) -> usize;
}

impl fmt::Debug for dyn PropertyObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyObserver")
            .field("id", &self.id())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Interception observer for a plain data property.
///
/// Holds only a weak handle to the object: the object owns its observer
/// cache, so a strong back-reference would cycle.
pub struct SetterObserver {
    id: ObserverId,
    obj: WeakObj,
    name: String,
    subscribers: ChangeSubscribers,
}

impl SetterObserver {
    /// Create an observer for `(obj, name)`. The caller (the locator)
    /// installs it into the object's cache.
    #[must_use]
    pub fn new(obj: &Obj, name: &str) -> Self {
        Self {
            id: ObserverId::next(),
            obj: obj.downgrade(),
            name: name.to_owned(),
            subscribers: ChangeSubscribers::new(),
        }
    }
}

impl PropertyObserver for SetterObserver {
    fn id(&self) -> ObserverId {
        self.id
    }

    fn value(&self) -> Value {
        match self.obj.upgrade() {
            Some(obj) => obj.get_raw(&self.name),
            None => Value::Null,
        }
    }

    fn set_value(&self, value: Value, flags: BindingFlags) {
        let Some(obj) = self.obj.upgrade() else {
            return;
        };
        let old = obj.get_raw(&self.name);
        if old == value {
            return;
        }
        obj.set_raw(&self.name, value.clone());
        for handler in self.subscribers.snapshot() {
            handler(&value, &old, flags);
        }
    }

    fn subscribe(self: Rc<Self>, handler: ChangeHandler) -> Subscription {
        let id = self.subscribers.add(handler);
        let weak = Rc::downgrade(&self);
        Subscription::new(move || {
            let Some(observer) = weak.upgrade() else {
                return;
            };
            if observer.subscribers.remove(id) == 0 {
                tracing::trace!(property = %observer.name, "uninstalling setter observer");
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

impl fmt::Debug for SetterObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetterObserver")
            .field("id", &self.id)
            .field("property", &self.name)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recording_handler(log: &Rc<RefCell<Vec<(Value, Value)>>>) -> ChangeHandler {
        let log = Rc::clone(log);
        Rc::new(move |new, old, _flags| {
            log.borrow_mut().push((new.clone(), old.clone()));
        })
    }

    #[test]
    fn set_value_writes_and_notifies() {
        let obj = Obj::with([("count", Value::Int(1))]);
        let observer = Rc::new(SetterObserver::new(&obj, "count"));
        let log = Rc::new(RefCell::new(Vec::new()));
        let _sub = Rc::clone(&observer).subscribe(recording_handler(&log));

        observer.set_value(Value::Int(2), BindingFlags::empty());
        assert_eq!(obj.get("count"), Value::Int(2));
        assert_eq!(log.borrow().as_slice(), &[(Value::Int(2), Value::Int(1))]);
    }

    #[test]
    fn equal_write_is_suppressed() {
        let obj = Obj::with([("count", Value::Int(1))]);
        let observer = Rc::new(SetterObserver::new(&obj, "count"));
        let log = Rc::new(RefCell::new(Vec::new()));
        let _sub = Rc::clone(&observer).subscribe(recording_handler(&log));

        observer.set_value(Value::Int(1), BindingFlags::empty());
        assert!(log.borrow().is_empty(), "equal write must not notify");
    }

    #[test]
    fn last_unsubscribe_uninstalls_interception() {
        let obj = Obj::with([("count", Value::Int(0))]);
        let observer: Rc<dyn PropertyObserver> = Rc::new(SetterObserver::new(&obj, "count"));
        obj.install_observer("count", Rc::clone(&observer));

        let log = Rc::new(RefCell::new(Vec::new()));
        let sub = Rc::clone(&observer).subscribe(recording_handler(&log));
        assert!(obj.observer_for("count").is_some());

        drop(sub);
        assert!(
            obj.observer_for("count").is_none(),
            "cache entry must be removed at zero subscribers"
        );
    }

    #[test]
    fn routed_obj_set_fans_out() {
        let obj = Obj::with([("count", Value::Int(0))]);
        let observer: Rc<dyn PropertyObserver> = Rc::new(SetterObserver::new(&obj, "count"));
        obj.install_observer("count", Rc::clone(&observer));

        let log_a = Rc::new(RefCell::new(Vec::new()));
        let log_b = Rc::new(RefCell::new(Vec::new()));
        let _sub_a = Rc::clone(&observer).subscribe(recording_handler(&log_a));
        let _sub_b = Rc::clone(&observer).subscribe(recording_handler(&log_b));

        obj.set("count", Value::Int(7));
        assert_eq!(log_a.borrow().len(), 1);
        assert_eq!(log_b.borrow().len(), 1);
    }

    #[test]
    fn silent_write_bypasses_interception() {
        let obj = Obj::with([("count", Value::Int(0))]);
        let observer: Rc<dyn PropertyObserver> = Rc::new(SetterObserver::new(&obj, "count"));
        obj.install_observer("count", Rc::clone(&observer));

        let log = Rc::new(RefCell::new(Vec::new()));
        let _sub = Rc::clone(&observer).subscribe(recording_handler(&log));

        obj.set_silent("count", Value::Int(5));
        assert_eq!(obj.get("count"), Value::Int(5));
        assert!(log.borrow().is_empty());
    }
}
