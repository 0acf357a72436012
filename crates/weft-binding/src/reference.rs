//! Ref bindings: publish a target reference into the scope.
//!
//! A ref binding writes its target (typically an element or component
//! object) to an assignable expression at bind, and clears it at unbind —
//! but only if the expression still holds that exact target. When two ref
//! bindings race for one property, last writer wins and the earlier
//! binding's unbind leaves the later reference intact.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use weft_expression::{Expr, Scope};
use weft_observation::{BindingFlags, Value};

use crate::error::BindingError;
use crate::state::BindingState;

/// Binding that assigns a fixed reference value through an expression.
pub struct RefBinding {
    expr: Rc<Expr>,
    target: Value,
    state: Cell<BindingState>,
    scope: RefCell<Option<Scope>>,
}

impl RefBinding {
    /// Construct an unbound ref binding publishing `target` through
    /// `expr`. `expr` must be assignable.
    #[must_use]
    pub fn new(expr: Rc<Expr>, target: Value) -> Self {
        Self {
            expr,
            target,
            state: Cell::new(BindingState::empty()),
            scope: RefCell::new(None),
        }
    }

    /// Assign the target reference through the expression.
    pub fn bind(&self, flags: BindingFlags, scope: &Scope) -> Result<(), BindingError> {
        if self.state.get().contains(BindingState::IS_BOUND) {
            if self.scope.borrow().as_ref() == Some(scope) {
                return Ok(());
            }
            self.unbind(flags);
        }
        // Read the state after the unbind-first path; a stale snapshot
        // would re-assert IS_BOUND during the binding phase.
        self.state
            .set(self.state.get() | BindingState::IS_BINDING);
        let flags = flags | BindingFlags::FROM_BIND;
        let result = self
            .expr
            .bind(flags, scope)
            .and_then(|()| self.expr.assign(flags, scope, self.target.clone()));
        if result.is_ok() {
            *self.scope.borrow_mut() = Some(scope.clone());
            self.state.set(BindingState::IS_BOUND);
        } else {
            self.state.set(BindingState::empty());
        }
        result.map_err(Into::into)
    }

    /// Clear the published reference, unless another writer has since
    /// replaced it. State is released even when the check fails.
    pub fn unbind(&self, flags: BindingFlags) {
        if !self.state.get().contains(BindingState::IS_BOUND) {
            return;
        }
        self.state
            .set(self.state.get() | BindingState::IS_UNBINDING);
        let flags = flags | BindingFlags::FROM_UNBIND;
        if let Some(scope) = self.scope.borrow_mut().take() {
            match self.expr.evaluate(flags, &scope, None) {
                Ok(current) if current == self.target => {
                    if let Err(e) = self.expr.assign(flags, &scope, Value::Null) {
                        tracing::error!(error = %e, "failed to clear reference");
                    }
                }
                Ok(_) => {
                    // Another ref binding took the property; leave it.
                }
                Err(e) => {
                    tracing::debug!(error = %e, "reference check failed during unbind");
                }
            }
            self.expr.unbind(flags, &scope);
        }
        self.state.set(BindingState::empty());
    }

    /// Whether the binding currently holds a scope.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.state.get().contains(BindingState::IS_BOUND)
    }
}

impl fmt::Debug for RefBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefBinding")
            .field("state", &self.state.get())
            .finish()
    }
}
