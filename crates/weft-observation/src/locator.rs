//! The observer registry: one shared observer per `(object, property)`.
//!
//! [`ObserverLocator`] is the single entry point bindings use to obtain
//! observers. It caches the observer on the object itself, so two bindings
//! observing the same pair share one instance (fan-out), and picks the
//! variant:
//!
//! - plain data property → [`SetterObserver`] (interception),
//! - computed or sealed property → [`DirtyCheckProperty`] (polling
//!   fallback; installation of interception is impossible, and per the
//!   error-handling policy this is not an error).

use std::fmt;
use std::rc::Rc;

use crate::collection::ArrayObserver;
use crate::dirty::{DirtyCheckProperty, DirtyChecker};
use crate::property::{PropertyObserver, SetterObserver};
use crate::value::{List, Obj};

/// Maps `(object, property)` to a single shared observer instance.
///
/// Cheap to clone; clones share the same dirty checker.
#[derive(Clone, Default)]
pub struct ObserverLocator {
    dirty: DirtyChecker,
}

impl ObserverLocator {
    /// Create a locator with a fresh [`DirtyChecker`].
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Create a locator sharing an existing checker (one flush cycle for
    /// several locators, e.g. across composed runtimes).
    #[must_use]
    pub fn with_checker(dirty: DirtyChecker) -> Rc<Self> {
        Rc::new(Self { dirty })
    }

    /// The checker the host runtime flushes between turns.
    #[must_use]
    pub fn dirty_checker(&self) -> &DirtyChecker {
        &self.dirty
    }

    /// Get or create the observer for `(obj, name)`.
    ///
    /// The same instance is returned for as long as it has subscribers;
    /// after the last unsubscribe a new request creates a fresh one.
    pub fn get_observer(&self, obj: &Obj, name: &str) -> Rc<dyn PropertyObserver> {
        if let Some(existing) = obj.observer_for(name) {
            return existing;
        }
        let observer: Rc<dyn PropertyObserver> = if obj.is_computed(name) || obj.is_sealed(name) {
            tracing::trace!(property = name, "falling back to dirty checking");
            Rc::new(DirtyCheckProperty::new(obj, name, self.dirty.clone()))
        } else {
            Rc::new(SetterObserver::new(obj, name))
        };
        obj.install_observer(name, Rc::clone(&observer));
        observer
    }

    /// Get or create the [`ArrayObserver`] attached to `list`.
    pub fn get_list_observer(&self, list: &List) -> Rc<ArrayObserver> {
        if let Some(existing) = list.attached_observer() {
            return existing;
        }
        let observer = Rc::new(ArrayObserver::new(list));
        list.attach_observer(Rc::clone(&observer));
        observer
    }
}

impl fmt::Debug for ObserverLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverLocator")
            .field("dirty", &self.dirty)
            .finish()
    }
}
