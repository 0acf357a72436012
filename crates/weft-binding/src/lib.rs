#![forbid(unsafe_code)]

//! Binding implementations for the Weft binding engine.
//!
//! A binding wires an expression, a target, and an observer locator
//! together with a specific data-flow direction:
//!
//! - [`PropertyBinding`] with a [`BindingMode`]: one-time, to-view,
//!   from-view, or two-way value flow between a source expression and a
//!   target property.
//! - [`CallBinding`]: evaluates a callable expression on explicit
//!   invocation (event handlers).
//! - [`RefBinding`]: installs its target into the location the expression
//!   designates, with a guarded clear on unbind.
//!
//! All bindings share the same lifecycle discipline, tracked by the
//! [`BindingState`] bitmask: binding → bound → unbinding, with idempotent
//! no-ops for same-scope rebinds and unbinds while unbound, and a
//! synchronous unbind-first when rebinding to a different scope.
//!
//! # Change propagation
//!
//! Connectable bindings rebuild their observer subscription set on every
//! evaluation pass ([`ObserverSlots`]): observers still on the evaluated
//! path are kept, newly touched ones are added, and the rest are pruned.
//! Propagation is fully synchronous; a binding's own write echoing back
//! through an observer it subscribes to is cut by a cheap re-entrancy
//! guard, and convergence is guaranteed by the observers' idempotent-write
//! suppression.
//!
//! # Errors
//!
//! `bind`, `unbind` (for ref bindings), and `call_source` surface
//! expression failures as [`BindingError`]. Inside an observer
//! notification there is no caller to return to — the mutation API is
//! infallible — so change handlers log evaluation failures at error level
//! and leave the binding in its last consistent state.

pub mod call;
pub mod connectable;
pub mod error;
pub mod property;
pub mod reference;
pub mod state;

pub use call::CallBinding;
pub use connectable::{ObserverSlots, SlotConnector};
pub use error::BindingError;
pub use property::{BindingMode, PropertyBinding};
pub use reference::RefBinding;
pub use state::BindingState;
