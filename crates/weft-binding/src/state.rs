//! Lifecycle state: a cheap, allocation-free phase bitmask.
//!
//! Every binding owns exactly one [`BindingState`]. Transitions follow a
//! fixed discipline:
//!
//! 1. `bind` on an already-bound binding with the same scope is a no-op;
//!    with a different scope it synchronously unbinds first.
//! 2. During `bind`, `IS_BINDING` is set before any expression work and
//!    cleared only after `IS_BOUND` is set — the two are never both clear
//!    mid-call.
//! 3. `unbind` while not bound is a no-op. During `unbind`, `IS_UNBINDING`
//!    is set before teardown; `IS_BOUND` and `IS_UNBINDING` are cleared
//!    together at the end.
//!
//! There is no concurrency to defend against (single cooperative
//! timeline); the flags exist so synchronous re-entrant calls can detect
//! what phase they interrupted.

use bitflags::bitflags;

bitflags! {
    /// Bind/unbind phase flags for one binding instance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BindingState: u8 {
        /// A `bind` call is in progress.
        const IS_BINDING = 1;
        /// The binding is bound to a scope.
        const IS_BOUND = 1 << 1;
        /// An `unbind` call is in progress.
        const IS_UNBINDING = 1 << 2;
        /// Bound, or currently tearing down.
        const BOUND_OR_UNBINDING = Self::IS_BOUND.bits() | Self::IS_UNBINDING.bits();
    }
}
