#![forbid(unsafe_code)]

//! Weft: a synchronous observation and binding engine for component UIs.
//!
//! This facade re-exports the three layers:
//!
//! - [`weft_observation`]: dynamic values ([`Value`], [`Obj`], [`List`]),
//!   property and collection observers, dirty checking, and the
//!   [`ObserverLocator`] registry.
//! - [`weft_expression`]: the binding expression tree ([`Expr`]) and the
//!   [`Scope`] chain expressions evaluate against.
//! - [`weft_binding`]: [`PropertyBinding`], [`CallBinding`], and
//!   [`RefBinding`], plus the shared lifecycle state.
//!
//! # Quick start
//!
//! ```
//! use std::rc::Rc;
//! use weft::prelude::*;
//!
//! let locator = ObserverLocator::new();
//! let vm = Obj::with([("message", Value::str("hello"))]);
//! let target = Obj::new();
//!
//! let binding = PropertyBinding::new(
//!     Expr::access_scope("message"),
//!     target.clone(),
//!     "text",
//!     BindingMode::ToView,
//!     Rc::clone(&locator),
//! );
//! binding.bind(BindingFlags::empty(), &Scope::new(vm.clone()))?;
//! assert_eq!(target.get("text"), Value::str("hello"));
//!
//! vm.set("message", Value::str("world"));
//! assert_eq!(target.get("text"), Value::str("world"));
//! # Ok::<(), weft::BindingError>(())
//! ```

pub use weft_binding::{
    BindingError, BindingMode, BindingState, CallBinding, ObserverSlots, PropertyBinding,
    RefBinding, SlotConnector,
};
pub use weft_expression::{
    BinaryOp, Connectable, Expr, ExprError, OverrideContext, Scope, UnaryOp,
};
pub use weft_observation::{
    ArrayObserver, BindingFlags, ChangeHandler, ChangeRecord, CollectionHandler, DirtyChecker,
    List, Method, Obj, ObserverId, ObserverLocator, PropertyObserver, Subscription, Value,
};

/// Everything most hosts need, in one import.
pub mod prelude {
    pub use weft_binding::{
        BindingError, BindingMode, BindingState, CallBinding, PropertyBinding, RefBinding,
    };
    pub use weft_expression::{BinaryOp, Expr, ExprError, Scope, UnaryOp};
    pub use weft_observation::{
        BindingFlags, ChangeRecord, List, Obj, ObserverLocator, Subscription, Value,
    };
}
