//! Property bindings: one-time, to-view, from-view, and two-way value
//! flow between a source expression and a target property.
//!
//! | Mode      | source change | target change | initial push        |
//! |-----------|---------------|---------------|---------------------|
//! | one-time  | ignored       | ignored       | source → target     |
//! | to-view   | re-push       | ignored       | source → target     |
//! | from-view | ignored       | assign source | none                |
//! | two-way   | re-push       | assign source | source → target     |
//!
//! # Re-entrancy
//!
//! Change handlers run synchronously inside the mutator's call stack. A
//! binding's own write can echo straight back through an observer it is
//! subscribed to (two-way target push, from-view source assign). The
//! binding's state cell is already mutably borrowed at that point, so the
//! handler's `try_borrow_mut` fails and the echo is dropped — other
//! bindings, with their own cells, still react. Convergence for longer
//! cycles is guaranteed by idempotent-write suppression in the observers.
//!
//! # Errors
//!
//! `bind` returns expression failures to the caller. Handlers triggered
//! by observer notifications have no caller to return to; they log the
//! failure and keep the binding's last consistent state.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use weft_expression::{Expr, Scope};
use weft_observation::{
    BindingFlags, ChangeHandler, CollectionHandler, Obj, ObserverLocator, Value,
};

use crate::connectable::{ObserverSlots, SlotConnector};
use crate::error::BindingError;
use crate::state::BindingState;

/// Data-flow direction of a [`PropertyBinding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// Push source to target once at bind; never again.
    OneTime,
    /// Push source to target at bind and on every source change.
    ToView,
    /// Assign target to source on every target change; no initial push.
    FromView,
    /// To-view plus from-view, initial push source → target.
    TwoWay,
}

impl BindingMode {
    fn observes_source(self) -> bool {
        matches!(self, Self::ToView | Self::TwoWay)
    }

    fn observes_target(self) -> bool {
        matches!(self, Self::FromView | Self::TwoWay)
    }

    fn pushes_initially(self) -> bool {
        !matches!(self, Self::FromView)
    }
}

struct Inner {
    expr: Rc<Expr>,
    target: Obj,
    target_property: String,
    mode: BindingMode,
    locator: Rc<ObserverLocator>,
    state: BindingState,
    scope: Option<Scope>,
    slots: ObserverSlots,
    target_subscription: Option<weft_observation::Subscription>,
    source_handler: ChangeHandler,
    list_handler: CollectionHandler,
    target_handler: ChangeHandler,
}

/// A binding connecting a source expression to a target property with a
/// [`BindingMode`]. Cheap to clone (shared state).
#[derive(Clone)]
pub struct PropertyBinding {
    inner: Rc<RefCell<Inner>>,
}

impl PropertyBinding {
    /// Construct an unbound binding over `(expr, target.target_property)`.
    #[must_use]
    pub fn new(
        expr: Rc<Expr>,
        target: Obj,
        target_property: impl Into<String>,
        mode: BindingMode,
        locator: Rc<ObserverLocator>,
    ) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<Inner>>| {
            let source_handler: ChangeHandler = {
                let weak = weak.clone();
                Rc::new(move |_new, _old, flags| {
                    let Some(cell) = weak.upgrade() else {
                        return;
                    };
                    // Borrow failure means this notification is our own
                    // write echoing back mid-operation; drop it.
                    let Ok(mut inner) = cell.try_borrow_mut() else {
                        return;
                    };
                    if let Err(e) = inner.handle_source_change(flags) {
                        tracing::error!(error = %e, "source re-evaluation failed");
                    }
                })
            };
            let list_handler: CollectionHandler = {
                let weak = weak.clone();
                Rc::new(move |_record, flags| {
                    let Some(cell) = weak.upgrade() else {
                        return;
                    };
                    let Ok(mut inner) = cell.try_borrow_mut() else {
                        return;
                    };
                    if let Err(e) = inner.handle_source_change(flags) {
                        tracing::error!(error = %e, "source re-evaluation failed");
                    }
                })
            };
            let target_handler: ChangeHandler = {
                let weak = weak.clone();
                Rc::new(move |new, _old, flags| {
                    let Some(cell) = weak.upgrade() else {
                        return;
                    };
                    let Ok(mut inner) = cell.try_borrow_mut() else {
                        return;
                    };
                    if let Err(e) = inner.handle_target_change(new.clone(), flags) {
                        tracing::error!(error = %e, "target-to-source assignment failed");
                    }
                })
            };
            RefCell::new(Inner {
                expr,
                target,
                target_property: target_property.into(),
                mode,
                locator,
                state: BindingState::empty(),
                scope: None,
                slots: ObserverSlots::new(),
                target_subscription: None,
                source_handler,
                list_handler,
                target_handler,
            })
        });
        Self { inner }
    }

    /// Bind to `scope`: evaluate, subscribe, and perform the mode's
    /// initial push.
    ///
    /// Binding again with the same scope is a no-op; with a different
    /// scope, the binding synchronously unbinds first.
    pub fn bind(&self, flags: BindingFlags, scope: &Scope) -> Result<(), BindingError> {
        self.inner.borrow_mut().bind(flags, scope)
    }

    /// Tear down subscriptions and release the scope. No-op when not
    /// bound.
    pub fn unbind(&self, flags: BindingFlags) {
        self.inner.borrow_mut().unbind(flags);
    }

    /// Whether the binding is currently bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.borrow().state.contains(BindingState::IS_BOUND)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BindingState {
        self.inner.borrow().state
    }

    /// Number of property observers currently subscribed to (diagnostic).
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().slots.property_count()
    }
}

impl Inner {
    fn bind(&mut self, flags: BindingFlags, scope: &Scope) -> Result<(), BindingError> {
        if self.state.contains(BindingState::IS_BOUND) {
            if self.scope.as_ref() == Some(scope) {
                return Ok(());
            }
            self.unbind(flags);
        }
        self.state |= BindingState::IS_BINDING;
        let flags = flags | BindingFlags::FROM_BIND;
        tracing::trace!(mode = ?self.mode, property = %self.target_property, "bind");

        let result = self.bind_inner(flags, scope);
        if result.is_ok() {
            self.state |= BindingState::IS_BOUND;
        }
        // A failed bind leaves the binding partially initialized by
        // contract; either way the transient phase flag is cleared.
        self.state -= BindingState::IS_BINDING;
        result
    }

    fn bind_inner(&mut self, flags: BindingFlags, scope: &Scope) -> Result<(), BindingError> {
        self.scope = Some(scope.clone());
        self.expr.bind(flags, scope)?;

        if self.mode.pushes_initially() {
            let value = if self.mode.observes_source() {
                self.evaluate_connected(flags, scope)?
            } else {
                self.expr.evaluate(flags, scope, None)?
            };
            self.push_to_target(value, flags);
        }
        if self.mode.observes_target() {
            let observer = self
                .locator
                .get_observer(&self.target, &self.target_property);
            self.target_subscription = Some(observer.subscribe(Rc::clone(&self.target_handler)));
        }
        Ok(())
    }

    fn unbind(&mut self, flags: BindingFlags) {
        if !self.state.contains(BindingState::IS_BOUND) {
            return;
        }
        self.state |= BindingState::IS_UNBINDING;
        let flags = flags | BindingFlags::FROM_UNBIND;
        tracing::trace!(mode = ?self.mode, property = %self.target_property, "unbind");

        if let Some(scope) = self.scope.take() {
            self.expr.unbind(flags, &scope);
        }
        self.target_subscription = None;
        self.slots.clear();
        self.state -= BindingState::IS_BOUND | BindingState::IS_UNBINDING;
    }

    fn handle_source_change(&mut self, flags: BindingFlags) -> Result<(), BindingError> {
        if !self.state.contains(BindingState::IS_BOUND) {
            return Ok(());
        }
        let Some(scope) = self.scope.clone() else {
            return Ok(());
        };
        let value = self.evaluate_connected(flags, &scope)?;
        self.push_to_target(value, flags);
        Ok(())
    }

    fn handle_target_change(&mut self, new: Value, flags: BindingFlags) -> Result<(), BindingError> {
        if !self.state.contains(BindingState::IS_BOUND) {
            return Ok(());
        }
        let Some(scope) = self.scope.clone() else {
            return Ok(());
        };
        self.expr
            .assign(flags | BindingFlags::UPDATE_SOURCE, &scope, new)?;
        Ok(())
    }

    /// Evaluate under a connect pass, refreshing the observer slot set
    /// and pruning observers no longer on the evaluated path.
    fn evaluate_connected(
        &mut self,
        flags: BindingFlags,
        scope: &Scope,
    ) -> Result<Value, BindingError> {
        self.slots.begin_pass();
        let expr = Rc::clone(&self.expr);
        let property_handler = Rc::clone(&self.source_handler);
        let list_handler = Rc::clone(&self.list_handler);
        let result = {
            let mut connector = SlotConnector {
                slots: &mut self.slots,
                locator: &self.locator,
                property_handler: &property_handler,
                list_handler: &list_handler,
            };
            expr.evaluate(flags, scope, Some(&mut connector))
        };
        // Prune even when evaluation failed partway: slots touched before
        // the error keep their fresh stamp, the rest are stale.
        self.slots.prune();
        Ok(result?)
    }

    fn push_to_target(&self, value: Value, flags: BindingFlags) {
        self.target.set_with_flags(
            &self.target_property,
            value,
            flags | BindingFlags::UPDATE_TARGET,
        );
    }
}

impl fmt::Debug for PropertyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("PropertyBinding")
            .field("mode", &inner.mode)
            .field("target_property", &inner.target_property)
            .field("state", &inner.state)
            .field("observers", &inner.slots.property_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    fn recording_target(
        locator: &Rc<ObserverLocator>,
        target: &Obj,
        property: &str,
    ) -> (Rc<StdRefCell<Vec<Value>>>, weft_observation::Subscription) {
        let log = Rc::new(StdRefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let observer = locator.get_observer(target, property);
        let sub = observer.subscribe(Rc::new(move |new, _, _| {
            l.borrow_mut().push(new.clone());
        }));
        (log, sub)
    }

    #[test]
    fn to_view_pushes_initial_and_updates() {
        let locator = ObserverLocator::new();
        let source = Obj::with([("count", Value::Int(1))]);
        let target = Obj::new();
        let (log, _sub) = recording_target(&locator, &target, "text");

        let binding = PropertyBinding::new(
            Expr::access_scope("count"),
            target.clone(),
            "text",
            BindingMode::ToView,
            Rc::clone(&locator),
        );
        let scope = Scope::new(source.clone());
        binding.bind(BindingFlags::empty(), &scope).unwrap();
        assert_eq!(log.borrow().as_slice(), &[Value::Int(1)]);

        source.set("count", Value::Int(2));
        assert_eq!(log.borrow().as_slice(), &[Value::Int(1), Value::Int(2)]);
        assert_eq!(target.get("text"), Value::Int(2));
    }

    #[test]
    fn one_time_never_updates() {
        let locator = ObserverLocator::new();
        let source = Obj::with([("count", Value::Int(1))]);
        let target = Obj::new();

        let binding = PropertyBinding::new(
            Expr::access_scope("count"),
            target.clone(),
            "text",
            BindingMode::OneTime,
            Rc::clone(&locator),
        );
        binding
            .bind(BindingFlags::empty(), &Scope::new(source.clone()))
            .unwrap();
        assert_eq!(target.get("text"), Value::Int(1));
        assert_eq!(binding.observer_count(), 0);

        source.set("count", Value::Int(2));
        assert_eq!(target.get("text"), Value::Int(1));
    }

    #[test]
    fn from_view_assigns_source_without_initial_push() {
        let locator = ObserverLocator::new();
        let source = Obj::with([("name", Value::str("a"))]);
        let target = Obj::with([("value", Value::str("widget"))]);

        let binding = PropertyBinding::new(
            Expr::access_scope("name"),
            target.clone(),
            "value",
            BindingMode::FromView,
            Rc::clone(&locator),
        );
        binding
            .bind(BindingFlags::empty(), &Scope::new(source.clone()))
            .unwrap();
        assert_eq!(source.get("name"), Value::str("a"), "no initial push");

        target.set("value", Value::str("typed"));
        assert_eq!(source.get("name"), Value::str("typed"));
    }

    #[test]
    fn two_way_syncs_both_directions() {
        let locator = ObserverLocator::new();
        let source = Obj::with([("name", Value::str("init"))]);
        let target = Obj::new();

        let binding = PropertyBinding::new(
            Expr::access_scope("name"),
            target.clone(),
            "value",
            BindingMode::TwoWay,
            Rc::clone(&locator),
        );
        binding
            .bind(BindingFlags::empty(), &Scope::new(source.clone()))
            .unwrap();
        assert_eq!(target.get("value"), Value::str("init"));

        source.set("name", Value::str("from-source"));
        assert_eq!(target.get("value"), Value::str("from-source"));

        target.set("value", Value::str("from-target"));
        assert_eq!(source.get("name"), Value::str("from-target"));
        // Settled: no infinite echo, values agree.
        assert_eq!(target.get("value"), Value::str("from-target"));
    }

    #[test]
    fn bind_error_propagates_and_leaves_unbound() {
        let locator = ObserverLocator::new();
        let source = Obj::with([("user", Value::Null)]);
        let target = Obj::new();

        let binding = PropertyBinding::new(
            Expr::member(Expr::access_scope("user"), "name"),
            target,
            "text",
            BindingMode::ToView,
            locator,
        );
        let err = binding
            .bind(BindingFlags::empty(), &Scope::new(source))
            .unwrap_err();
        assert!(matches!(err, BindingError::Expression(_)));
        assert!(!binding.is_bound());
    }
}
