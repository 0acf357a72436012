//! Observer slot management for connectable bindings.
//!
//! A connectable binding rebuilds its subscription set on every
//! evaluation pass. [`ObserverSlots`] implements that with version
//! stamps: [`begin_pass`](ObserverSlots::begin_pass) bumps the current
//! version, observing an already-held observer refreshes its stamp,
//! and [`prune`](ObserverSlots::prune) drops every slot the pass did not
//! touch — the RAII subscriptions unsubscribe on drop, so a pruned
//! observer with no other subscribers tears itself down.
//!
//! [`SlotConnector`] adapts this to the
//! [`Connectable`](weft_expression::Connectable) seam expressions report
//! into, resolving observers through the
//! [`ObserverLocator`](weft_observation::ObserverLocator).

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use weft_expression::Connectable;
use weft_observation::{
    ArrayObserver, ChangeHandler, CollectionHandler, List, Obj, ObserverId, ObserverLocator,
    PropertyObserver, Subscription,
};

type Map<K, V> = HashMap<K, V, ahash::RandomState>;

struct Slot {
    version: u64,
    _subscription: Subscription,
}

/// Version-stamped set of the observers one binding is subscribed to.
#[derive(Default)]
pub struct ObserverSlots {
    version: u64,
    properties: Map<ObserverId, Slot>,
    lists: Map<ObserverId, Slot>,
}

impl ObserverSlots {
    /// Create an empty slot set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new evaluation pass.
    pub fn begin_pass(&mut self) {
        self.version += 1;
    }

    /// Hold a subscription to `observer`, subscribing with `handler` if
    /// this is the first pass that touches it. Idempotent within a pass.
    pub fn observe_property(&mut self, observer: Rc<dyn PropertyObserver>, handler: &ChangeHandler) {
        let version = self.version;
        self.properties
            .entry(observer.id())
            .and_modify(|slot| slot.version = version)
            .or_insert_with(|| Slot {
                version,
                _subscription: observer.subscribe(Rc::clone(handler)),
            });
    }

    /// Collection counterpart of [`ObserverSlots::observe_property`].
    pub fn observe_list(&mut self, observer: &Rc<ArrayObserver>, handler: &CollectionHandler) {
        let version = self.version;
        self.lists
            .entry(observer.id())
            .and_modify(|slot| slot.version = version)
            .or_insert_with(|| Slot {
                version,
                _subscription: Rc::clone(observer).subscribe(Rc::clone(handler)),
            });
    }

    /// Drop every slot not touched by the current pass.
    pub fn prune(&mut self) {
        let version = self.version;
        self.properties.retain(|_, slot| slot.version == version);
        self.lists.retain(|_, slot| slot.version == version);
    }

    /// Drop all slots (unbind teardown).
    pub fn clear(&mut self) {
        self.properties.clear();
        self.lists.clear();
    }

    /// Number of held property subscriptions.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Number of held collection subscriptions.
    #[must_use]
    pub fn list_count(&self) -> usize {
        self.lists.len()
    }
}

impl fmt::Debug for ObserverSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSlots")
            .field("version", &self.version)
            .field("properties", &self.properties.len())
            .field("lists", &self.lists.len())
            .finish()
    }
}

/// Adapter that lets an expression's connect pass fill an
/// [`ObserverSlots`] through an [`ObserverLocator`].
pub struct SlotConnector<'a> {
    /// The binding's slot set.
    pub slots: &'a mut ObserverSlots,
    /// The registry observers are resolved through.
    pub locator: &'a ObserverLocator,
    /// Handler subscribed to newly observed properties.
    pub property_handler: &'a ChangeHandler,
    /// Handler subscribed to newly observed collections.
    pub list_handler: &'a CollectionHandler,
}

impl Connectable for SlotConnector<'_> {
    fn observe_property(&mut self, obj: &Obj, name: &str) {
        let observer = self.locator.get_observer(obj, name);
        self.slots.observe_property(observer, self.property_handler);
    }

    fn observe_list(&mut self, list: &List) {
        let observer = self.locator.get_list_observer(list);
        self.slots.observe_list(&observer, self.list_handler);
    }
}

impl fmt::Debug for SlotConnector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotConnector")
            .field("slots", self.slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use weft_observation::Value;

    fn noop_handler() -> ChangeHandler {
        Rc::new(|_, _, _| {})
    }

    #[test]
    fn repeat_observation_keeps_one_subscription() {
        let locator = ObserverLocator::new();
        let obj = Obj::with([("x", Value::Int(1))]);
        let mut slots = ObserverSlots::new();
        let handler = noop_handler();

        slots.begin_pass();
        let observer = locator.get_observer(&obj, "x");
        slots.observe_property(Rc::clone(&observer), &handler);
        slots.observe_property(Rc::clone(&observer), &handler);
        slots.prune();

        assert_eq!(slots.property_count(), 1);
        assert_eq!(observer.subscriber_count(), 1);
    }

    #[test]
    fn untouched_slots_are_pruned() {
        let locator = ObserverLocator::new();
        let obj = Obj::with([("x", Value::Int(1)), ("y", Value::Int(2))]);
        let mut slots = ObserverSlots::new();
        let handler = noop_handler();

        slots.begin_pass();
        slots.observe_property(locator.get_observer(&obj, "x"), &handler);
        slots.observe_property(locator.get_observer(&obj, "y"), &handler);
        slots.prune();
        assert_eq!(slots.property_count(), 2);

        slots.begin_pass();
        slots.observe_property(locator.get_observer(&obj, "y"), &handler);
        slots.prune();
        assert_eq!(slots.property_count(), 1);

        // The pruned observer lost its only subscriber: a later write to
        // `x` must not reach the handler.
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        let watcher: ChangeHandler = Rc::new(move |_, _, _| f.set(true));
        let fresh = locator.get_observer(&obj, "x");
        let _sub = fresh.subscribe(watcher);
        obj.set("x", Value::Int(9));
        assert!(fired.get(), "fresh observer sees the write");
    }

    #[test]
    fn kept_slot_survives_pass_without_resubscribing() {
        let locator = ObserverLocator::new();
        let obj = Obj::with([("x", Value::Int(1))]);
        let mut slots = ObserverSlots::new();
        let handler = noop_handler();

        slots.begin_pass();
        let observer = locator.get_observer(&obj, "x");
        slots.observe_property(Rc::clone(&observer), &handler);
        slots.prune();

        slots.begin_pass();
        slots.observe_property(Rc::clone(&observer), &handler);
        slots.prune();

        assert_eq!(observer.subscriber_count(), 1, "no duplicate subscription");
    }

    #[test]
    fn clear_drops_everything() {
        let locator = ObserverLocator::new();
        let obj = Obj::with([("x", Value::Int(1))]);
        let mut slots = ObserverSlots::new();
        let handler = noop_handler();

        slots.begin_pass();
        let observer = locator.get_observer(&obj, "x");
        slots.observe_property(Rc::clone(&observer), &handler);
        slots.clear();

        assert_eq!(slots.property_count(), 0);
        assert_eq!(observer.subscriber_count(), 0);
    }
}
