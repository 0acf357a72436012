//! Call bindings: invoke a source expression on demand, with
//! call-site arguments layered over the bound scope.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use weft_expression::{Expr, Scope};
use weft_observation::{BindingFlags, Obj, Value};

use crate::error::BindingError;
use crate::state::BindingState;

/// A binding that evaluates its expression only when the host asks,
/// typically in response to an event.
///
/// `bind` captures the scope without evaluating; [`call_source`]
/// evaluates under an override context carrying the call's named
/// arguments, so the expression can reference them like any other scope
/// property while outer lookups still reach the original contexts.
///
/// [`call_source`]: CallBinding::call_source
pub struct CallBinding {
    expr: Rc<Expr>,
    state: Cell<BindingState>,
    scope: RefCell<Option<Scope>>,
}

impl CallBinding {
    /// Construct an unbound call binding over `expr`.
    #[must_use]
    pub fn new(expr: Rc<Expr>) -> Self {
        Self {
            expr,
            state: Cell::new(BindingState::empty()),
            scope: RefCell::new(None),
        }
    }

    /// Capture `scope` for later calls. Rebinding with the same scope is
    /// a no-op; a different scope replaces the old one.
    pub fn bind(&self, flags: BindingFlags, scope: &Scope) -> Result<(), BindingError> {
        if self.state.get().contains(BindingState::IS_BOUND) {
            if self.scope.borrow().as_ref() == Some(scope) {
                return Ok(());
            }
            self.unbind(flags);
        }
        self.state
            .set(self.state.get() | BindingState::IS_BINDING);
        if let Err(e) = self.expr.bind(flags | BindingFlags::FROM_BIND, scope) {
            self.state.set(BindingState::empty());
            return Err(e.into());
        }
        *self.scope.borrow_mut() = Some(scope.clone());
        self.state.set(BindingState::IS_BOUND);
        Ok(())
    }

    /// Release the scope. No-op when not bound.
    pub fn unbind(&self, flags: BindingFlags) {
        if !self.state.get().contains(BindingState::IS_BOUND) {
            return;
        }
        self.state
            .set(self.state.get() | BindingState::IS_UNBINDING);
        if let Some(scope) = self.scope.borrow_mut().take() {
            self.expr.unbind(flags | BindingFlags::FROM_UNBIND, &scope);
        }
        self.state.set(BindingState::empty());
    }

    /// Evaluate the expression with `args` visible as scope properties.
    ///
    /// Returns [`BindingError::NotBound`] when called before `bind` or
    /// after `unbind`.
    pub fn call_source(
        &self,
        args: impl IntoIterator<Item = (&'static str, Value)>,
        flags: BindingFlags,
    ) -> Result<Value, BindingError> {
        let scope = self.scope.borrow();
        let Some(scope) = scope.as_ref() else {
            return Err(BindingError::NotBound);
        };
        let call_scope = scope.push_override(Obj::with(args));
        Ok(self.expr.evaluate(flags, &call_scope, None)?)
    }

    /// Whether the binding currently holds a scope.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.state.get().contains(BindingState::IS_BOUND)
    }
}

impl fmt::Debug for CallBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallBinding")
            .field("state", &self.state.get())
            .finish()
    }
}
