//! The scope chain expressions evaluate against.
//!
//! A [`Scope`] pairs the root binding context (the component's view-model)
//! with a chain of [`OverrideContext`]s. Template constructs that
//! introduce names (repeat items, `let` bindings) push a new override
//! context; name resolution walks the chain from the innermost override
//! outward and falls back to the root binding context.
//!
//! Scopes are cheap to clone (shared contexts) and compare by identity:
//! two scopes are equal iff they share both the binding context and the
//! override chain head. The binding lifecycle relies on this for its
//! same-scope rebind no-op.

use std::fmt;
use std::rc::Rc;

use weft_observation::Obj;

use crate::error::ExprError;

/// One link in the override chain.
pub struct OverrideContext {
    binding_context: Obj,
    parent: Option<Rc<OverrideContext>>,
}

impl OverrideContext {
    /// The context object introduced at this level.
    #[must_use]
    pub fn binding_context(&self) -> &Obj {
        &self.binding_context
    }

    /// The enclosing override context, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Rc<OverrideContext>> {
        self.parent.as_ref()
    }
}

impl fmt::Debug for OverrideContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideContext")
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// The (binding context, override context) pair a binding evaluates
/// against. Immutable for the duration of one bind cycle.
#[derive(Clone)]
pub struct Scope {
    binding_context: Obj,
    override_context: Rc<OverrideContext>,
}

impl Scope {
    /// Root scope over a component's binding context.
    #[must_use]
    pub fn new(binding_context: Obj) -> Self {
        let override_context = Rc::new(OverrideContext {
            binding_context: binding_context.clone(),
            parent: None,
        });
        Self {
            binding_context,
            override_context,
        }
    }

    /// Derive a nested scope with `context` pushed as a new override
    /// (repeat item, `let` binding). The root binding context is shared.
    #[must_use]
    pub fn push_override(&self, context: Obj) -> Self {
        Self {
            binding_context: self.binding_context.clone(),
            override_context: Rc::new(OverrideContext {
                binding_context: context,
                parent: Some(Rc::clone(&self.override_context)),
            }),
        }
    }

    /// The root binding context.
    #[must_use]
    pub fn binding_context(&self) -> &Obj {
        &self.binding_context
    }

    /// The innermost override context.
    #[must_use]
    pub fn override_context(&self) -> &Rc<OverrideContext> {
        &self.override_context
    }

    /// The context `ancestor` hops up the chain (`0` = innermost).
    ///
    /// Errors with [`ExprError::UndefinedContext`] when the chain is
    /// shorter than requested.
    pub fn ancestor_context(&self, ancestor: usize) -> Result<Obj, ExprError> {
        let mut current = Some(Rc::clone(&self.override_context));
        for _ in 0..ancestor {
            current = current.and_then(|c| c.parent.clone());
        }
        current
            .map(|c| c.binding_context.clone())
            .ok_or(ExprError::UndefinedContext { ancestor })
    }

    /// Resolve the context that owns `name`.
    ///
    /// With `ancestor > 0`, resolution is pinned to that chain level (the
    /// `$parent.name` form). Otherwise the chain is walked innermost-first
    /// for a context exposing `name`; when none does, the root binding
    /// context is returned so writes can create the property there.
    pub fn context_for(&self, name: &str, ancestor: usize) -> Result<Obj, ExprError> {
        if ancestor > 0 {
            return self.ancestor_context(ancestor);
        }
        let mut current = Some(Rc::clone(&self.override_context));
        while let Some(context) = current {
            if context.binding_context.has(name) {
                return Ok(context.binding_context.clone());
            }
            current = context.parent.clone();
        }
        Ok(self.binding_context.clone())
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        Obj::ptr_eq(&self.binding_context, &other.binding_context)
            && Rc::ptr_eq(&self.override_context, &other.override_context)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0;
        let mut current = Some(Rc::clone(&self.override_context));
        while let Some(context) = current {
            depth += 1;
            current = context.parent.clone();
        }
        f.debug_struct("Scope").field("depth", &depth).finish()
    }
}
