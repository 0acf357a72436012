#![forbid(unsafe_code)]

//! Binding expressions for the Weft binding engine.
//!
//! An [`Expr`] is an immutable tree describing how a binding reads (and,
//! for assignable shapes, writes) a value against a [`Scope`]. Trees are
//! built programmatically, shared via `Rc` across every binding instance
//! of the same compiled template, and never mutated after construction —
//! all per-binding mutable state (scope, observer subscriptions) lives in
//! the binding, not here.
//!
//! Evaluation supports an optional **connect pass**: when a
//! [`Connectable`] is supplied, every property and collection touched on
//! the evaluated path is reported to it, which is how bindings build their
//! observer subscription set. Branches not taken (conditional arms, the
//! short-circuited side of `&&`/`||`) are not reported, which is what
//! makes stale-observer pruning work.
//!
//! Expression errors ([`ExprError`]) propagate synchronously to the
//! caller; nothing here retries or recovers.

pub mod ast;
pub mod connect;
pub mod error;
pub mod scope;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use connect::{Connectable, RecordingConnectable};
pub use error::ExprError;
pub use scope::{OverrideContext, Scope};
