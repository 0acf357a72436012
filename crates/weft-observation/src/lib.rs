#![forbid(unsafe_code)]

//! Change observation for the Weft binding engine.
//!
//! This crate provides the machinery that detects mutations of application
//! state and broadcasts them to interested bindings:
//!
//! - [`Value`], [`Obj`], [`List`]: the dynamic value domain binding
//!   expressions evaluate against. `Obj` is the interception seam — once a
//!   setter observer is installed for a property, every routed write fans
//!   out to subscribers synchronously.
//! - [`SetterObserver`]: per `(object, property)` interception observer.
//! - [`DirtyCheckProperty`] / [`DirtyChecker`]: polling fallback for
//!   properties that cannot be intercepted (computed getters, sealed
//!   properties).
//! - [`ArrayObserver`]: structured change records for list mutations.
//! - [`ObserverLocator`]: maps `(object, property)` to a single shared
//!   observer, creating lazily and choosing the right variant.
//! - [`BindingFlags`]: the opaque context bit-set threaded through every
//!   observation call.
//!
//! # Architecture
//!
//! Everything here is single-threaded: shared ownership is `Rc`, interior
//! mutability is `RefCell`/`Cell`. All notification is synchronous within
//! the mutator's call stack; the only deferred path is
//! [`DirtyChecker::flush`], which the host runtime drives between turns.
//!
//! # Invariants
//!
//! 1. One observer instance per `(object, property)` pair at any time;
//!    concurrent subscribers share it (fan-out).
//! 2. An observer's `set_value` notifies only when the new value differs
//!    from the current one (idempotent-write suppression).
//! 3. Subscribers are notified in registration order; a subscriber removing
//!    itself from within a notification neither skips nor double-notifies
//!    the others.
//! 4. The last unsubscribe tears the observer down: interception is
//!    uninstalled, dirty-check registration is dropped.

pub mod collection;
pub mod dirty;
pub mod flags;
pub mod locator;
pub mod property;
pub mod subscriber;
pub mod value;

pub use collection::{ArrayObserver, ChangeRecord, CollectionHandler};
pub use dirty::{DirtyCheckProperty, DirtyChecker};
pub use flags::BindingFlags;
pub use locator::ObserverLocator;
pub use property::{ChangeHandler, ObserverId, PropertyObserver, SetterObserver};
pub use subscriber::{Subscribers, Subscription};
pub use value::{List, Method, Obj, Value};
